//! Global shader parameters visible to every pass for the rest of a frame.

use std::collections::HashMap;

use crate::resource::TextureHandle;

/// Interned identifier of a named shader parameter.
///
/// Ids are a pure function of the name (32-bit FNV-1a), so they can be
/// computed in `const` context and never need a mutable registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(u32);

impl PropertyId {
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash: u32 = 0x811c_9dc5;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u32;
            hash = hash.wrapping_mul(0x0100_0193);
            i += 1;
        }
        PropertyId(hash)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// A value stored in the global parameter table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GlobalValue {
    Float(f32),
    Texture(TextureHandle),
}

#[derive(Debug, Clone, Default)]
pub struct GlobalParams {
    values: HashMap<PropertyId, GlobalValue>,
}

impl GlobalParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_float(&mut self, id: PropertyId, value: f32) {
        self.values.insert(id, GlobalValue::Float(value));
    }

    pub fn set_texture(&mut self, id: PropertyId, texture: TextureHandle) {
        self.values.insert(id, GlobalValue::Texture(texture));
    }

    pub fn get(&self, id: PropertyId) -> Option<GlobalValue> {
        self.values.get(&id).copied()
    }

    pub fn float(&self, id: PropertyId) -> Option<f32> {
        match self.get(id)? {
            GlobalValue::Float(value) => Some(value),
            _ => None,
        }
    }

    pub fn texture(&self, id: PropertyId) -> Option<TextureHandle> {
        match self.get(id)? {
            GlobalValue::Texture(handle) => Some(handle),
            _ => None,
        }
    }

    /// Whether any texture parameter currently points at `texture`.
    pub fn references(&self, texture: TextureHandle) -> bool {
        self.values
            .values()
            .any(|value| *value == GlobalValue::Texture(texture))
    }

    pub fn iter(&self) -> impl Iterator<Item = (PropertyId, GlobalValue)> + '_ {
        self.values.iter().map(|(id, value)| (*id, *value))
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
