/// Ordered set of library function names included ahead of `main`.
///
/// Insertion order is kept and repeated names are ignored, so the emitted
/// function order only depends on the order names were first added in.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct FunctionLibrary {
    names: Vec<String>,
}

impl FunctionLibrary {
    pub fn new() -> Self {
        FunctionLibrary::default()
    }

    /// Adds `name`, returning `false` if it was already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|it| it == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> Extend<S> for FunctionLibrary {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        for name in iter {
            self.insert(name);
        }
    }
}

impl<S: Into<String>> FromIterator<S> for FunctionLibrary {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut library = FunctionLibrary::new();
        library.extend(iter);
        library
    }
}
