#[derive(Clone, Copy, Debug)]
pub(crate) struct Fnv1a64(u64);

impl Fnv1a64 {
    pub(crate) const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;

    pub(crate) fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub(crate) fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    pub(crate) fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_str(&mut self, s: &str) {
        self.write_u64(s.len() as u64);
        self.write_bytes(s.as_bytes());
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h ^= u64::from(b);
            h = h.wrapping_mul(Self::PRIME);
        }
        self.0 = h;
    }

    pub(crate) fn write_json(&mut self, v: &serde_json::Value) {
        match v {
            serde_json::Value::Null => self.write_u8(0),
            serde_json::Value::Bool(x) => {
                self.write_u8(1);
                self.write_u8(u8::from(*x));
            }
            serde_json::Value::Number(n) => {
                self.write_u8(2);
                if let Some(i) = n.as_i64() {
                    self.write_u8(0);
                    self.write_u64(i as u64);
                } else if let Some(u) = n.as_u64() {
                    self.write_u8(1);
                    self.write_u64(u);
                } else if let Some(f) = n.as_f64() {
                    self.write_u8(2);
                    self.write_u64(f.to_bits());
                } else {
                    self.write_u8(3);
                    self.write_str(&n.to_string());
                }
            }
            serde_json::Value::String(s) => {
                self.write_u8(3);
                self.write_str(s);
            }
            serde_json::Value::Array(items) => {
                self.write_u8(4);
                self.write_u64(items.len() as u64);
                for item in items {
                    self.write_json(item);
                }
            }
            serde_json::Value::Object(map) => {
                self.write_u8(5);
                let mut keys = map.keys().collect::<Vec<_>>();
                keys.sort_unstable();
                self.write_u64(keys.len() as u64);
                for k in keys {
                    self.write_str(k);
                    self.write_json(&map[k]);
                }
            }
        }
    }

    pub(crate) fn finish(self) -> u64 {
        self.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
