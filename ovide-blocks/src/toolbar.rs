//! Side toolbar of a contextualization block.

use crate::host::{HostCallbacks, HostCapability};
use crate::i18n::NamespacedTranslator;
use ovide_types::Resource;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolbarAction {
    /// Remove this placement (the resource stays in the library)
    Delete,
    /// Edit this placement's parameters
    EditParameters,
    /// Open the underlying resource's configuration
    EditResource,
}

impl ToolbarAction {
    pub const ALL: [ToolbarAction; 3] = [
        ToolbarAction::Delete,
        ToolbarAction::EditParameters,
        ToolbarAction::EditResource,
    ];

    /// Host capability backing this action
    pub fn capability(&self) -> HostCapability {
        match self {
            ToolbarAction::Delete => HostCapability::DeleteContextualization,
            ToolbarAction::EditParameters => HostCapability::EditContextualization,
            ToolbarAction::EditResource => HostCapability::ConfigureResource,
        }
    }

    pub fn tone(&self) -> ButtonTone {
        match self {
            ToolbarAction::Delete => ButtonTone::Danger,
            ToolbarAction::EditParameters => ButtonTone::Info,
            ToolbarAction::EditResource => ButtonTone::Primary,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ToolbarAction::Delete => "fa fa-trash",
            ToolbarAction::EditParameters => "fa fa-pencil-alt",
            ToolbarAction::EditResource => "settings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonTone {
    Danger,
    Info,
    Primary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolbarButton {
    pub action: ToolbarAction,
    pub tone: ButtonTone,
    pub icon: &'static str,
    pub tooltip: String,
    /// False when the host lacks the backing capability; clicking is then a no-op
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolbarView {
    pub active: bool,
    pub buttons: Vec<ToolbarButton>,
}

impl ToolbarView {
    pub fn build(
        resource: &Resource,
        active: bool,
        host: &HostCallbacks,
        translate: &NamespacedTranslator<'_>,
    ) -> Self {
        let buttons = ToolbarAction::ALL
            .iter()
            .map(|action| ToolbarButton {
                action: *action,
                tone: action.tone(),
                icon: action.icon(),
                tooltip: tooltip(*action, resource, translate),
                available: host.has(action.capability()),
            })
            .collect();

        Self { active, buttons }
    }

    pub fn button(&self, action: ToolbarAction) -> Option<&ToolbarButton> {
        self.buttons.iter().find(|b| b.action == action)
    }

    /// CSS class list of the toolbar container
    pub fn class_name(&self) -> &'static str {
        if self.active {
            "block-asset-side-toolbar is-active"
        } else {
            "block-asset-side-toolbar"
        }
    }
}

fn tooltip(action: ToolbarAction, resource: &Resource, translate: &NamespacedTranslator<'_>) -> String {
    match action {
        ToolbarAction::Delete => translate.translate(
            "delete mention (the item will not be deleted from the library)",
            &[],
        ),
        ToolbarAction::EditParameters => translate.translate("edit mention parameters", &[]),
        ToolbarAction::EditResource => {
            translate.translate(&format!("edit {}", resource.resource_type()), &[])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{IdentityTranslator, TableTranslator};

    #[test]
    fn test_buttons_in_order_with_tooltips() {
        let resource = Resource::new("r1", "image");
        let host = HostCallbacks::new().with_delete_contextualization(|_| {});
        let translate = NamespacedTranslator::new(&IdentityTranslator, "Components.BlockContextualization");

        let view = ToolbarView::build(&resource, true, &host, &translate);
        let actions: Vec<ToolbarAction> = view.buttons.iter().map(|b| b.action).collect();
        assert_eq!(actions, ToolbarAction::ALL.to_vec());

        let edit = view.button(ToolbarAction::EditResource).unwrap();
        assert_eq!(edit.tooltip, "edit image");
        assert_eq!(edit.tone, ButtonTone::Primary);
        assert!(!edit.available);
        assert!(view.button(ToolbarAction::Delete).unwrap().available);
        assert_eq!(view.class_name(), "block-asset-side-toolbar is-active");
    }

    #[test]
    fn test_edit_tooltip_looks_up_key_per_resource_type() {
        let resource = Resource::new("r1", "image");
        let table = TableTranslator::new()
            .with_entry("Components.BlockContextualization.edit image", "modifier l'image");
        let translate = NamespacedTranslator::new(&table, "Components.BlockContextualization");

        let view = ToolbarView::build(&resource, false, &HostCallbacks::new(), &translate);
        let edit = view.button(ToolbarAction::EditResource).unwrap();
        assert_eq!(edit.tooltip, "modifier l'image");

        let video_view = ToolbarView::build(
            &Resource::new("r2", "video"),
            false,
            &HostCallbacks::new(),
            &translate,
        );
        assert_eq!(
            video_view.button(ToolbarAction::EditResource).unwrap().tooltip,
            "edit video"
        );
    }
}
