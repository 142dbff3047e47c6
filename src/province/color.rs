use std::collections::HashSet;

/// Раздаёт уникальные цвета провинций
///
/// Чёрный цвет зарезервирован за служебной провинцией 0.
#[derive(Debug, Clone)]
pub struct ColorAllocator {
    used: HashSet<[u8; 3]>,
    cursor: u32,
}

impl Default for ColorAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            used: HashSet::from([[0, 0, 0]]),
            cursor: 0,
        }
    }

    /// Возвращает `preferred`, если он корректен и свободен, иначе следующий свободный цвет
    pub fn assign(&mut self, preferred: Option<&str>) -> String {
        if let Some(rgb) = preferred.and_then(parse_hex)
            && self.used.insert(rgb)
        {
            return to_hex(rgb);
        }
        loop {
            let rgb = spread(self.cursor);
            self.cursor += 1;
            if self.used.insert(rgb) {
                return to_hex(rgb);
            }
        }
    }
}

/// Разносит соседние номера по кубу RGB, чтобы соседние провинции различались на глаз
fn spread(n: u32) -> [u8; 3] {
    let h = n.wrapping_mul(0x9E37_79B9).rotate_left(7) ^ n;
    [(h >> 16) as u8, (h >> 8) as u8, h as u8]
}

#[must_use]
pub fn parse_hex(color: &str) -> Option<[u8; 3]> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    Some([
        u8::from_str_radix(hex.get(0..2)?, 16).ok()?,
        u8::from_str_radix(hex.get(2..4)?, 16).ok()?,
        u8::from_str_radix(hex.get(4..6)?, 16).ok()?,
    ])
}

fn to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}
