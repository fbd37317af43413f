//! Focusable, clickable button with a text label

use alloc::boxed::Box;
use alloc::string::String;
use embedded_graphics::pixelcolor::Rgb565;
use log::warn;

use crate::binding::ReactiveProperty;
use crate::error::{LayoutResult, PropertyResult, UiResult};
use crate::geometry::{Size, Thickness};
use crate::ui::components::text::TextBlock;
use crate::ui::context::LayoutContext;
use crate::ui::core::{Action, Alignment, Clickable, Focusable, HitTestResult};
use crate::ui::element::{Affects, ChildSlot, Element, ElementBase, ElementId};
use crate::ui::layouts::ContentControl;
use crate::ui::styling::{AppliedStyle, Brush, ColorPalette, Style};
use crate::ui::tree::ElementTree;

/// Button with a centered text label.
///
/// Focus applies [`Button::focus_style`] to the button's own properties and
/// unfocus reverts it. A click runs the command (if any) and hands the
/// configured [`Action`] back to the view manager.
///
/// # Examples
/// ```ignore
/// let settings = Button::new("Settings")
///     .with_action(Action::Navigate(ViewKey::of::<SettingsView>()))
///     .with_tab_index(1)
///     .insert_named(&mut tree, "settings")?;
/// ```
pub struct Button {
    control: ContentControl,
    text: ReactiveProperty<String>,
    font_color: ReactiveProperty<Rgb565>,
    tab_index: ReactiveProperty<i32>,
    is_focused: ReactiveProperty<bool>,
    enabled: ReactiveProperty<bool>,
    palette: ColorPalette,
    focus_style: Style,
    applied_focus: Option<AppliedStyle>,
    command: Option<Box<dyn FnMut()>>,
    action: Option<Action>,
}

impl Button {
    pub fn new(text: &str) -> Self {
        let palette = ColorPalette::default();
        Self {
            control: ContentControl::new()
                .with_padding(Thickness::symmetric(6.0, 4.0))
                .with_content_alignment(Alignment::Center, Alignment::Center),
            text: ReactiveProperty::new("text", String::from(text)),
            font_color: ReactiveProperty::new("font_color", palette.text_primary),
            tab_index: ReactiveProperty::new("tab_index", 0),
            is_focused: ReactiveProperty::new("is_focused", false),
            enabled: ReactiveProperty::new("enabled", true),
            focus_style: Self::default_focus_style(&palette),
            palette,
            applied_focus: None,
            command: None,
            action: None,
        }
    }

    fn default_focus_style(palette: &ColorPalette) -> Style {
        Style::new()
            .with("background", Brush::rounded(palette.accent, 3, true))
            .with("font_color", palette.background)
    }

    /// Recolor the button and rebuild its focus style from `palette`.
    pub fn with_palette(mut self, palette: ColorPalette) -> Self {
        self.font_color.set(palette.text_primary);
        self.focus_style = Self::default_focus_style(&palette);
        self.palette = palette;
        self
    }

    pub fn with_focus_style(mut self, style: Style) -> Self {
        self.focus_style = style;
        self
    }

    /// Closure run on every click, before the action is returned.
    pub fn with_command(mut self, command: impl FnMut() + 'static) -> Self {
        self.command = Some(Box::new(command));
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_tab_index(self, tab_index: i32) -> Self {
        self.tab_index.set(tab_index);
        self
    }

    pub fn with_padding(self, padding: Thickness) -> Self {
        self.control.padding().set(padding);
        self
    }

    /// Insert the button and its label into `tree`.
    pub fn insert(self, tree: &mut ElementTree) -> UiResult<ElementId> {
        let id = tree.insert(self)?;
        Self::attach_label(tree, id)
    }

    /// Like [`Button::insert`], with a name usable for focus lookups.
    pub fn insert_named(self, tree: &mut ElementTree, name: &str) -> UiResult<ElementId> {
        let id = tree.insert_named(name, self)?;
        Self::attach_label(tree, id)
    }

    fn attach_label(tree: &mut ElementTree, id: ElementId) -> UiResult<ElementId> {
        let label = tree.insert(TextBlock::new(""))?;
        // owner links, so the label keeps following the button across detach
        if let (Some(button), Some(block)) = (tree.get::<Button>(id), tree.get::<TextBlock>(label)) {
            let text = block.text().clone();
            text.set(button.text.get());
            button.text.link(move |change| text.set(change.value.clone()));

            let color = block.color().clone();
            color.set(button.font_color.get());
            button.font_color.link(move |change| color.set(change.value));
        }
        tree.set_content(id, Some(label))?;
        Ok(id)
    }

    pub fn text(&self) -> &ReactiveProperty<String> {
        &self.text
    }

    pub fn font_color(&self) -> &ReactiveProperty<Rgb565> {
        &self.font_color
    }

    pub fn tab_index_property(&self) -> &ReactiveProperty<i32> {
        &self.tab_index
    }

    /// Read-only from the outside; changed through [`Focusable`].
    pub fn focused(&self) -> &ReactiveProperty<bool> {
        &self.is_focused
    }

    pub fn enabled(&self) -> &ReactiveProperty<bool> {
        &self.enabled
    }

    pub fn focus_style(&self) -> &Style {
        &self.focus_style
    }

    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }

    pub fn action(&self) -> Option<Action> {
        self.action
    }
}

impl Element for Button {
    fn bind(&mut self, base: &ElementBase) -> PropertyResult<()> {
        self.control.bind_properties(base)?;
        base.register(&self.text, Affects::Nothing)?;
        base.register(&self.font_color, Affects::Render)?;
        base.register(&self.tab_index, Affects::Nothing)?;
        base.register(&self.is_focused, Affects::Render)?;
        base.register(&self.enabled, Affects::Render)?;
        base.background()
            .set(Brush::rounded(self.palette.accent, 3, false));
        Ok(())
    }

    fn child_count(&self) -> usize {
        self.control.child_count()
    }

    fn child_at(&self, index: usize) -> Option<ElementId> {
        self.control.child_at(index)
    }

    fn child_slot(&mut self) -> Option<ChildSlot<'_>> {
        Some(self.control.slot())
    }

    fn measure_override(&mut self, cx: &mut LayoutContext<'_>, available: Size) -> LayoutResult<Size> {
        self.control.measure_content(cx, available)
    }

    fn arrange_override(&mut self, cx: &mut LayoutContext<'_>, final_size: Size) -> LayoutResult<Size> {
        self.control.arrange_content(cx, final_size)
    }

    fn on_unload(&mut self, _base: &ElementBase) {
        if let Some(applied) = self.applied_focus.take() {
            applied.revert();
        }
        self.is_focused.set_if_changed(false);
    }

    fn as_focusable(&mut self) -> Option<&mut dyn Focusable> {
        Some(self)
    }

    fn as_clickable(&mut self) -> Option<&mut dyn Clickable> {
        Some(self)
    }
}

impl Focusable for Button {
    fn tab_index(&self) -> i32 {
        self.tab_index.get()
    }

    fn is_focused(&self) -> bool {
        self.is_focused.get()
    }

    fn focus(&mut self, base: &ElementBase) {
        if self.applied_focus.is_none() {
            match self.focus_style.apply(base.object()) {
                Ok(applied) => self.applied_focus = Some(applied),
                Err(e) => warn!("Focus style not applied to {:?}: {}", base.id(), e),
            }
        }
        self.is_focused.set_if_changed(true);
    }

    fn unfocus(&mut self, _base: &ElementBase) {
        if let Some(applied) = self.applied_focus.take() {
            applied.revert();
        }
        self.is_focused.set_if_changed(false);
    }
}

impl Clickable for Button {
    fn click(&mut self, _base: &ElementBase, _hit: &HitTestResult) -> Option<Action> {
        if !self.enabled.get() {
            return None;
        }
        if let Some(command) = self.command.as_mut() {
            command();
        }
        self.action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::layout_manager::{LayoutManager, MAX_LAYOUT_PASSES};
    use crate::ui::styling::COLOR_ACCENT;
    use alloc::rc::Rc;
    use core::cell::Cell;

    fn hit(element: ElementId) -> HitTestResult {
        HitTestResult {
            element,
            point: Point::ZERO,
            local_point: Point::ZERO,
        }
    }

    #[test]
    fn measures_label_plus_padding() {
        let mut tree = ElementTree::new();
        let id = Button::new("OK")
            .with_padding(Thickness::all(2.0))
            .insert(&mut tree)
            .unwrap();
        let base = tree.base(id).unwrap();
        base.horizontal_alignment().set(Alignment::Start);
        base.vertical_alignment().set(Alignment::Start);

        let mut manager = LayoutManager::new(&mut tree, id, MAX_LAYOUT_PASSES).unwrap();
        manager.set_allocated_size(Size::new(100.0, 100.0));
        manager.execute_initial_layout_pass(&mut tree).unwrap();

        // "OK" in the 6x10 font
        assert_eq!(tree.base(id).unwrap().desired_size(), Size::new(16.0, 14.0));
        let label = tree.children(id)[0];
        assert_eq!(
            tree.get::<TextBlock>(label).unwrap().text().get(),
            String::from("OK")
        );
    }

    #[test]
    fn label_follows_button_text() {
        let mut tree = ElementTree::new();
        let id = Button::new("Start").insert(&mut tree).unwrap();
        let label = tree.children(id)[0];

        tree.get::<Button>(id).unwrap().text().set(String::from("Stop"));
        assert_eq!(
            tree.get::<TextBlock>(label).unwrap().text().get(),
            String::from("Stop")
        );
    }

    #[test]
    fn click_runs_command_and_returns_action() {
        let mut tree = ElementTree::new();
        let clicks = Rc::new(Cell::new(0));
        let counter = Rc::clone(&clicks);
        let id = Button::new("Go")
            .with_command(move || counter.set(counter.get() + 1))
            .with_action(Action::Custom(7))
            .insert(&mut tree)
            .unwrap();

        let action = tree.with_element_mut(id, |element, base| {
            element.as_clickable().and_then(|c| c.click(base, &hit(id)))
        });
        assert_eq!(action, Some(Some(Action::Custom(7))));
        assert_eq!(clicks.get(), 1);

        tree.get::<Button>(id).unwrap().enabled().set(false);
        let action = tree.with_element_mut(id, |element, base| {
            element.as_clickable().and_then(|c| c.click(base, &hit(id)))
        });
        assert_eq!(action, Some(None));
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn focus_applies_and_unfocus_reverts_the_style() {
        let mut tree = ElementTree::new();
        let id = Button::new("Go").insert(&mut tree).unwrap();
        let outline = Brush::rounded(COLOR_ACCENT, 3, false);
        assert_eq!(tree.base(id).unwrap().background().get(), outline);

        tree.with_element_mut(id, |element, base| {
            if let Some(focusable) = element.as_focusable() {
                focusable.focus(base);
            }
        });
        let button = tree.get::<Button>(id).unwrap();
        assert!(button.focused().get());
        assert_eq!(
            tree.base(id).unwrap().background().get(),
            Brush::rounded(COLOR_ACCENT, 3, true)
        );
        assert_eq!(button.font_color().get(), ColorPalette::dark().background);

        tree.with_element_mut(id, |element, base| {
            if let Some(focusable) = element.as_focusable() {
                focusable.unfocus(base);
            }
        });
        let button = tree.get::<Button>(id).unwrap();
        assert!(!button.focused().get());
        assert_eq!(tree.base(id).unwrap().background().get(), outline);
        assert_eq!(button.font_color().get(), ColorPalette::dark().text_primary);
    }
}
