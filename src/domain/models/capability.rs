/// A host primitive that may or may not exist on this device. Resolved once
/// at startup and handed to the controllers that consume it.
pub enum Capability<T> {
    Available(T),
    Unavailable,
}

impl<T> Capability<T> {
    pub fn from_option(handle: Option<T>) -> Capability<T> {
        match handle {
            Some(handle) => return Capability::Available(handle),
            None => return Capability::Unavailable,
        }
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Capability::Available(handle) => return Some(handle),
            Capability::Unavailable => return None,
        }
    }

    pub fn is_available(&self) -> bool {
        return matches!(self, Capability::Available(_));
    }
}

impl<T> Default for Capability<T> {
    fn default() -> Capability<T> {
        return Capability::Unavailable;
    }
}
