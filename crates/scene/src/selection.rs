use serde::{Deserialize, Serialize};

/// Path of model names from the root model down to a selected model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelPath(pub Vec<String>);

impl SelPath {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn to_model(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// Name of the selected model (last element).
    pub fn model_name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Ordered selection; the first path is the primary selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    paths: Vec<SelPath>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            paths: names.into_iter().map(SelPath::to_model).collect(),
        }
    }

    pub fn add(&mut self, path: SelPath) {
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn count(&self) -> usize {
        self.paths.len()
    }

    pub fn paths(&self) -> &[SelPath] {
        &self.paths
    }

    pub fn primary(&self) -> Option<&SelPath> {
        self.paths.first()
    }

    /// Selected model names in selection order.
    pub fn model_names(&self) -> Vec<String> {
        self.paths
            .iter()
            .filter_map(|path| path.model_name().map(str::to_string))
            .collect()
    }
}
