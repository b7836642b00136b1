// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

/// This trait allows our keys to be responsive to multiple inputs
pub trait IntoKey {
    fn into_key(self) -> Vec<u8>;
}

/// Keys can be vectors of String
impl IntoKey for Vec<u8> {
    fn into_key(self) -> Vec<u8> {
        self
    }
}

/// Keys can be references to vectors of bytes (&Vec<u8>)
impl IntoKey for &Vec<u8> {
    fn into_key(self) -> Vec<u8> {
        self.clone()
    }
}

/// Keys can be vectors of String
impl IntoKey for Vec<String> {
    fn into_key(self) -> Vec<u8> {
        self.join("/").into_bytes()
    }
}

/// Keys can be vectors of &str
impl<'a> IntoKey for Vec<&'a str> {
    fn into_key(self) -> Vec<u8> {
        self.join("/").into_bytes()
    }
}

/// Keys can be String
impl IntoKey for String {
    fn into_key(self) -> Vec<u8> {
        self.into_bytes()
    }
}

/// Keys can be &String
impl IntoKey for &String {
    fn into_key(self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

/// Keys can be &str
impl<'a> IntoKey for &'a str {
    fn into_key(self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

/// Numeric keys are zero padded so that lexical key order matches numeric order
impl IntoKey for u32 {
    fn into_key(self) -> Vec<u8> {
        format!("{:010}", self).into_bytes()
    }
}

impl IntoKey for u64 {
    fn into_key(self) -> Vec<u8> {
        format!("{:020}", self).into_bytes()
    }
}
