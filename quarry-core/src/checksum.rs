use crate::{Entity, Result, Value};
use std::hash::{Hash, Hasher};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a 64 bit hasher.
#[derive(Debug, Clone, Copy)]
pub struct Fnv64(u64);

impl Default for Fnv64 {
    fn default() -> Self {
        Fnv64(FNV_OFFSET)
    }
}

impl Hasher for Fnv64 {
    fn finish(&self) -> u64 {
        self.0
    }
    fn write(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 ^= *b as u64;
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }
}

/// Structural hash of the values a row persists.
///
/// Each value is tagged with its type name, so `1i32` and `1i64` differ.
pub fn checksum_values<'a>(values: impl IntoIterator<Item = &'a Value>) -> u64 {
    let mut hasher = Fnv64::default();
    for value in values {
        hasher.write(value.type_name().as_bytes());
        value.hash(&mut hasher);
    }
    hasher.finish()
}

/// Checksum of the persisted (non computed) columns of the entity.
pub fn checksum<E: Entity>(entity: &E) -> Result<u64> {
    let table = E::describe()?;
    let row = entity.row();
    Ok(checksum_values(
        table
            .columns
            .iter()
            .zip(row.iter())
            .filter(|(c, _)| c.persisted())
            .map(|(_, v)| v),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv_reference_values() {
        let mut hasher = Fnv64::default();
        hasher.write(b"");
        assert_eq!(hasher.finish(), 0xcbf29ce484222325);
        let mut hasher = Fnv64::default();
        hasher.write(b"a");
        assert_eq!(hasher.finish(), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn type_tagged() {
        let a = checksum_values(&[Value::Int32(Some(1))]);
        let b = checksum_values(&[Value::Int64(Some(1))]);
        assert_ne!(a, b);
        assert_eq!(a, checksum_values(&[Value::Int32(Some(1))]));
        assert_ne!(
            checksum_values(&[Value::Varchar(Some("a".into())), Value::Null]),
            checksum_values(&[Value::Null, Value::Varchar(Some("a".into()))]),
        );
    }
}
