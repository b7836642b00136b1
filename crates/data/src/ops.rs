// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::IntoKey;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Insert(pub Vec<u8>, pub Vec<u8>);
impl Insert {
    pub fn new<K: IntoKey>(key: K, value: Vec<u8>) -> Self {
        Self(key.into_key(), value)
    }

    pub fn key(&self) -> &Vec<u8> {
        &self.0
    }

    pub fn value(&self) -> &Vec<u8> {
        &self.1
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Get(pub Vec<u8>);
impl Get {
    pub fn new<K: IntoKey>(key: K) -> Self {
        Self(key.into_key())
    }

    pub fn key(&self) -> &Vec<u8> {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Remove(pub Vec<u8>);
impl Remove {
    pub fn new<K: IntoKey>(key: K) -> Self {
        Self(key.into_key())
    }

    pub fn key(&self) -> &Vec<u8> {
        &self.0
    }
}

/// Replace the value at `key` with `new` only when the current value equals `expected`.
/// An `expected` of `None` means the key must be absent.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompareAndSwap {
    key: Vec<u8>,
    expected: Option<Vec<u8>>,
    new: Vec<u8>,
}

impl CompareAndSwap {
    pub fn new<K: IntoKey>(key: K, expected: Option<Vec<u8>>, new: Vec<u8>) -> Self {
        Self {
            key: key.into_key(),
            expected,
            new,
        }
    }

    pub fn key(&self) -> &Vec<u8> {
        &self.key
    }

    pub fn expected(&self) -> Option<&Vec<u8>> {
        self.expected.as_ref()
    }

    pub fn value(&self) -> &Vec<u8> {
        &self.new
    }
}

impl From<CompareAndSwap> for Insert {
    fn from(value: CompareAndSwap) -> Self {
        Insert(value.key, value.new)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScanPrefix(pub Vec<u8>);
impl ScanPrefix {
    pub fn new<K: IntoKey>(prefix: K) -> Self {
        Self(prefix.into_key())
    }

    pub fn prefix(&self) -> &Vec<u8> {
        &self.0
    }
}
