//! In-memory driver for unit tests
//!
//! Elements match a locator when one of their selectors equals the locator's
//! CSS string exactly. Clicks can trigger scripted reactions that mutate the
//! view, which is enough to model redirects, toasts and spinners.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{Driver, DriverFactory, ElementState};
use crate::error::{E2eError, E2eResult};
use crate::intercept::StubRule;
use crate::locator::Locator;

pub type ElementId = usize;

type Reaction = Box<dyn FnMut(&mut FakeView) + Send>;

#[derive(Debug, Clone)]
pub struct FakeElement {
    selectors: Vec<String>,
    parent: Option<ElementId>,
    text: String,
    visible: bool,
    value: Option<String>,
    attributes: BTreeMap<String, String>,
    /// Removed after this many queries have matched it
    vanish_after: Option<usize>,
    seen: usize,
    removed: bool,
}

impl FakeElement {
    pub fn new(selector: &str) -> Self {
        Self {
            selectors: vec![selector.to_string()],
            parent: None,
            text: String::new(),
            visible: true,
            value: None,
            attributes: BTreeMap::new(),
            vanish_after: None,
            seen: 0,
            removed: false,
        }
    }

    /// A form control with an empty value.
    pub fn input(selector: &str) -> Self {
        Self::new(selector).value("")
    }

    pub fn also(mut self, selector: &str) -> Self {
        self.selectors.push(selector.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn child_of(mut self, parent: ElementId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn vanish_after(mut self, queries: usize) -> Self {
        self.vanish_after = Some(queries);
        self
    }

    fn state(&self) -> ElementState {
        ElementState {
            text: self.text.clone(),
            visible: self.visible,
            value: self.value.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

/// Mutable page model shared by the driver and its reactions
#[derive(Default)]
pub struct FakeView {
    pub url: String,
    elements: Vec<FakeElement>,
    on_click: HashMap<ElementId, Reaction>,
    on_url_read: Option<Reaction>,
    exceptions: Vec<String>,
    stubs: Vec<String>,
    hits: HashMap<String, usize>,
    visits: Vec<String>,
    clicks: Vec<String>,
    typed: Vec<(String, String)>,
    screenshots: Vec<PathBuf>,
    closed: bool,
}

impl FakeView {
    pub fn add(&mut self, element: FakeElement) -> ElementId {
        self.elements.push(element);
        self.elements.len() - 1
    }

    pub fn value_of(&self, id: ElementId) -> Option<String> {
        self.elements[id].value.clone()
    }

    pub fn set_value(&mut self, id: ElementId, value: &str) {
        self.elements[id].value = Some(value.to_string());
    }

    /// Run `reaction` every time element `id` is clicked.
    pub fn on_click(&mut self, id: ElementId, reaction: impl FnMut(&mut FakeView) + Send + 'static) {
        self.on_click.insert(id, Box::new(reaction));
    }

    pub fn set_url(&mut self, url: &str) {
        self.url = url.to_string();
    }

    /// Remove every element carrying `selector`.
    pub fn remove(&mut self, selector: &str) {
        for el in self.elements.iter_mut() {
            if el.selectors.iter().any(|s| s == selector) {
                el.removed = true;
            }
        }
    }

    pub fn throw(&mut self, message: &str) {
        self.exceptions.push(message.to_string());
    }

    /// Record one request answered by the stub with this alias.
    pub fn hit(&mut self, alias: &str) {
        *self.hits.entry(alias.to_string()).or_insert(0) += 1;
    }

    fn is_descendant(&self, id: ElementId, ancestor: ElementId) -> bool {
        let mut current = self.elements[id].parent;
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.elements[p].parent;
        }
        false
    }

    fn resolve(&self, locator: &Locator) -> Vec<ElementId> {
        let roots = locator.scope.as_ref().map(|scope| self.resolve(scope));

        let mut found: Vec<ElementId> = self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, el)| !el.removed && el.selectors.iter().any(|s| *s == locator.css))
            .filter(|(id, _)| match &roots {
                Some(roots) => roots.iter().any(|r| self.is_descendant(*id, *r)),
                None => true,
            })
            .filter(|(_, el)| match &locator.text {
                Some(text) => el.text.contains(text.as_str()),
                None => true,
            })
            .map(|(id, _)| id)
            .collect();

        if let Some(index) = locator.index {
            found = found.get(index).map(|id| vec![*id]).unwrap_or_default();
        }
        found
    }

    fn target(&self, locator: &Locator, require_visible: bool) -> E2eResult<ElementId> {
        let id = *self
            .resolve(locator)
            .first()
            .ok_or_else(|| E2eError::AssertionFailed(format!("{} not found", locator)))?;
        if require_visible && !self.elements[id].visible {
            return Err(E2eError::AssertionFailed(format!("{} is not visible", locator)));
        }
        Ok(id)
    }
}

/// Clonable handle; clones share the same view.
#[derive(Clone, Default)]
pub struct FakeDriver {
    view: Arc<Mutex<FakeView>>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, element: FakeElement) -> ElementId {
        self.view.lock().add(element)
    }

    /// Run `reaction` every time element `id` is clicked.
    pub fn on_click(&self, id: ElementId, reaction: impl FnMut(&mut FakeView) + Send + 'static) {
        self.view.lock().on_click(id, reaction);
    }

    /// Run `reaction` every time the current URL is read.
    pub fn on_url_read(&self, reaction: impl FnMut(&mut FakeView) + Send + 'static) {
        self.view.lock().on_url_read = Some(Box::new(reaction));
    }

    pub fn throw(&self, message: &str) {
        self.view.lock().throw(message);
    }

    pub fn hit(&self, alias: &str) {
        self.view.lock().hit(alias);
    }

    pub fn url(&self) -> String {
        self.view.lock().url.clone()
    }

    pub fn value_of(&self, id: ElementId) -> Option<String> {
        self.view.lock().elements[id].value.clone()
    }

    pub fn installed_stubs(&self) -> Vec<String> {
        self.view.lock().stubs.clone()
    }

    pub fn visits(&self) -> Vec<String> {
        self.view.lock().visits.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.view.lock().clicks.clone()
    }

    pub fn typed(&self) -> Vec<(String, String)> {
        self.view.lock().typed.clone()
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.view.lock().screenshots.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.view.lock().closed
    }
}

#[async_trait]
impl Driver for FakeDriver {
    async fn visit(&self, url: &str) -> E2eResult<()> {
        let mut view = self.view.lock();
        view.url = url.to_string();
        view.visits.push(url.to_string());
        Ok(())
    }

    async fn reload(&self) -> E2eResult<()> {
        let mut view = self.view.lock();
        let url = view.url.clone();
        view.visits.push(url);
        Ok(())
    }

    async fn current_url(&self) -> E2eResult<String> {
        let mut view = self.view.lock();
        if let Some(mut reaction) = view.on_url_read.take() {
            reaction(&mut *view);
            view.on_url_read = Some(reaction);
        }
        Ok(view.url.clone())
    }

    async fn query(&self, locator: &Locator) -> E2eResult<Vec<ElementState>> {
        let mut view = self.view.lock();
        let ids = view.resolve(locator);
        let states = ids.iter().map(|id| view.elements[*id].state()).collect();

        for id in ids {
            let el = &mut view.elements[id];
            el.seen += 1;
            if el.vanish_after.is_some_and(|n| el.seen >= n) {
                el.removed = true;
            }
        }
        Ok(states)
    }

    async fn click(&self, locator: &Locator, force: bool) -> E2eResult<()> {
        let mut view = self.view.lock();
        let id = view.target(locator, !force)?;
        view.clicks.push(locator.to_string());

        if let Some(mut reaction) = view.on_click.remove(&id) {
            reaction(&mut *view);
            view.on_click.entry(id).or_insert(reaction);
        }
        Ok(())
    }

    async fn clear(&self, locator: &Locator) -> E2eResult<()> {
        let mut view = self.view.lock();
        let id = view.target(locator, true)?;
        view.elements[id].value = Some(String::new());
        Ok(())
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> E2eResult<()> {
        let mut view = self.view.lock();
        let id = view.target(locator, true)?;
        view.elements[id].value.get_or_insert_with(String::new).push_str(text);
        view.typed.push((locator.to_string(), text.to_string()));
        Ok(())
    }

    async fn set_viewport(&self, _width: u32, _height: u32) -> E2eResult<()> {
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> E2eResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, b"\x89PNG\r\n\x1a\nfake")?;
        self.view.lock().screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn install_stub(&self, rule: &StubRule) -> E2eResult<()> {
        let mut view = self.view.lock();
        view.stubs.retain(|alias| *alias != rule.alias);
        view.stubs.push(rule.alias.clone());
        Ok(())
    }

    fn stub_hits(&self, alias: &str) -> usize {
        self.view.lock().hits.get(alias).copied().unwrap_or(0)
    }

    fn drain_exceptions(&self) -> Vec<String> {
        std::mem::take(&mut self.view.lock().exceptions)
    }

    async fn close(&self) -> E2eResult<()> {
        self.view.lock().closed = true;
        Ok(())
    }
}

/// Hands out drivers built by a setup closure, one per open.
pub struct FakeFactory {
    setup: Box<dyn Fn() -> FakeDriver + Send + Sync>,
    opened: Mutex<Vec<FakeDriver>>,
}

impl FakeFactory {
    pub fn new(setup: impl Fn() -> FakeDriver + Send + Sync + 'static) -> Self {
        Self {
            setup: Box::new(setup),
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Every driver opened so far, in order.
    pub fn opened(&self) -> Vec<FakeDriver> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl DriverFactory for FakeFactory {
    async fn open(&self) -> E2eResult<Box<dyn Driver>> {
        let driver = (self.setup)();
        self.opened.lock().push(driver.clone());
        Ok(Box::new(driver))
    }

    async fn shutdown(&self) -> E2eResult<()> {
        Ok(())
    }
}
