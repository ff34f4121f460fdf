pub mod revised;
