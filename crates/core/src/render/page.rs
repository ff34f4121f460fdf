use super::{InputWidget, Marker, RenderSurface, RenderTarget, TableKey, TableTarget, TargetKey};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

const STATUS_DOT: &str = "status-dot";

/// Which targets, tables and widgets a page variant carries.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    targets: BTreeMap<TargetKey, RenderTarget>,
    tables: BTreeSet<TableKey>,
    widgets: BTreeSet<InputWidget>,
}

impl Layout {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every text target except the recommendation block (which is created on demand),
    /// every table, all three widgets, and status dots on the metric tiles.
    pub fn full() -> Self {
        let mut layout = Self::empty();
        for key in TargetKey::ALL {
            if key != TargetKey::Recommendation {
                layout = layout.with_target(key);
            }
        }
        for key in TableKey::ALL {
            layout = layout.with_table(key);
        }
        for widget in InputWidget::ALL {
            layout = layout.with_widget(widget);
        }
        layout
            .with_marker(TargetKey::AssetAMetric, STATUS_DOT)
            .with_marker(TargetKey::AssetBMetric, STATUS_DOT)
            .with_marker(TargetKey::CurrentFloor, STATUS_DOT)
    }

    pub fn with_target(mut self, key: TargetKey) -> Self {
        self.targets.entry(key).or_default();
        self
    }

    pub fn with_marker(mut self, key: TargetKey, class: &str) -> Self {
        self.targets
            .insert(key, RenderTarget::with_marker(Marker::new(class)));
        self
    }

    pub fn with_table(mut self, key: TableKey) -> Self {
        self.tables.insert(key);
        self
    }

    pub fn with_widget(mut self, widget: InputWidget) -> Self {
        self.widgets.insert(widget);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InputState {
    pub value: String,
    pub user_edited: bool,
}

/// In-memory render surface plus the input widgets of one session.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    targets: BTreeMap<TargetKey, RenderTarget>,
    tables: BTreeMap<TableKey, TableTarget>,
    inputs: BTreeMap<InputWidget, InputState>,
    last_modified: Option<DateTime<Utc>>,
}

impl Page {
    pub fn new(layout: Layout, last_modified: Option<DateTime<Utc>>) -> Self {
        Self {
            targets: layout.targets,
            tables: layout
                .tables
                .into_iter()
                .map(|k| (k, TableTarget::default()))
                .collect(),
            inputs: layout
                .widgets
                .into_iter()
                .map(|w| (w, InputState::default()))
                .collect(),
            last_modified,
        }
    }

    pub fn target(&self, key: TargetKey) -> Option<&RenderTarget> {
        self.targets.get(&key)
    }

    pub fn text(&self, key: TargetKey) -> Option<String> {
        self.targets.get(&key).map(RenderTarget::text)
    }

    pub fn table(&self, key: TableKey) -> Option<&TableTarget> {
        self.tables.get(&key)
    }

    pub fn input_value(&self, widget: InputWidget) -> Option<&str> {
        self.inputs.get(&widget).map(|s| s.value.as_str())
    }

    pub fn is_user_edited(&self, widget: InputWidget) -> bool {
        self.inputs.get(&widget).is_some_and(|s| s.user_edited)
    }

    /// Records a user edit. Returns false when the page has no such widget.
    pub fn user_edit(&mut self, widget: InputWidget, value: &str) -> bool {
        match self.inputs.get_mut(&widget) {
            Some(state) => {
                state.value = value.to_string();
                state.user_edited = true;
                true
            }
            None => false,
        }
    }

    /// Fills a widget programmatically, but only while it is still empty and untouched.
    pub fn prefill(&mut self, widget: InputWidget, value: &str) -> bool {
        match self.inputs.get_mut(&widget) {
            Some(state) if !state.user_edited && state.value.trim().is_empty() => {
                state.value = value.to_string();
                true
            }
            _ => false,
        }
    }
}

impl RenderSurface for Page {
    fn target_mut(&mut self, key: TargetKey) -> Option<&mut RenderTarget> {
        self.targets.get_mut(&key)
    }

    fn ensure_target(
        &mut self,
        key: TargetKey,
        make: &dyn Fn() -> RenderTarget,
    ) -> &mut RenderTarget {
        self.targets.entry(key).or_insert_with(make)
    }

    fn table_mut(&mut self, key: TableKey) -> Option<&mut TableTarget> {
        self.tables.get_mut(&key)
    }

    fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }
}
