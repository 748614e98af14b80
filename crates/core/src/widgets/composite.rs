use super::{DragInfo, WidgetBase};

/// Bookkeeping for a widget made of named sub-widgets. Only one sub-widget
/// may be dragged at a time, and while it is, hovering is disabled on its
/// siblings.
#[derive(Debug)]
pub struct CompositeWidget {
    base: WidgetBase,
    sub_widget_names: Vec<String>,
    active_sub_widget: Option<String>,
}

impl CompositeWidget {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        sub_widget_names: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            base: WidgetBase::new(name),
            sub_widget_names: sub_widget_names.into_iter().map(Into::into).collect(),
            active_sub_widget: None,
        }
    }

    pub fn base(&self) -> &WidgetBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    pub fn sub_widget_names(&self) -> &[String] {
        &self.sub_widget_names
    }

    pub fn has_sub_widget(&self, name: &str) -> bool {
        self.sub_widget_names.iter().any(|sub| sub == name)
    }

    pub fn active_sub_widget(&self) -> Option<&str> {
        self.active_sub_widget.as_deref()
    }

    pub fn is_dragging(&self) -> bool {
        self.active_sub_widget.is_some()
    }

    /// Sub-widget a drag starts on, taken from the innermost hit part.
    pub fn pick_sub_widget(&self, info: &DragInfo) -> String {
        match info.inner_part() {
            Some(name) if self.has_sub_widget(name) => name.to_string(),
            other => panic!(
                "{}: drag did not hit a sub-widget (hit {other:?})",
                self.base.name()
            ),
        }
    }

    pub fn sub_widget_activated(&mut self, name: &str, is_activation: bool) {
        assert!(
            self.has_sub_widget(name),
            "{}: unknown sub-widget {name:?}",
            self.base.name()
        );
        if is_activation {
            if let Some(active) = &self.active_sub_widget {
                panic!(
                    "{}: {name} activated while {active} is dragged",
                    self.base.name()
                );
            }
            self.active_sub_widget = Some(name.to_string());
        } else {
            assert_eq!(
                self.active_sub_widget.as_deref(),
                Some(name),
                "{}: deactivated sub-widget is not the active one",
                self.base.name()
            );
            self.active_sub_widget = None;
        }
        self.base.set_active(is_activation);
    }

    pub fn is_sub_widget_hover_enabled(&self, name: &str) -> bool {
        match &self.active_sub_widget {
            Some(active) => active == name,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_sub_widget_at_a_time() {
        let mut composite = CompositeWidget::new("Parts", ["A", "B"]);
        composite.sub_widget_activated("A", true);
        assert_eq!(composite.active_sub_widget(), Some("A"));
        assert!(composite.base().is_active());
        assert!(composite.is_sub_widget_hover_enabled("A"));
        assert!(!composite.is_sub_widget_hover_enabled("B"));

        composite.sub_widget_activated("A", false);
        assert!(composite.is_sub_widget_hover_enabled("B"));
        assert!(!composite.base().is_active());
    }

    #[test]
    #[should_panic(expected = "while A is dragged")]
    fn second_activation_panics() {
        let mut composite = CompositeWidget::new("Parts", ["A", "B"]);
        composite.sub_widget_activated("A", true);
        composite.sub_widget_activated("B", true);
    }
}
