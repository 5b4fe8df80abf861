//! Static target catalog: one animal identity per letter A–Z.
//!
//! The catalog is immutable and loaded once; gameplay only ever reads it.
//! Each entry carries the display name (Chinese), an English name, the emoji
//! glyph shown on the key, and the call description used as a fallback cue.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// One letter → identity record. `name` is also the spawn / hint audio cue text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Animal {
    pub letter: char,
    pub name: &'static str,
    pub name_en: &'static str,
    pub emoji: &'static str,
    pub sound: &'static str,
}

pub static ANIMALS: [Animal; 26] = [
    Animal { letter: 'A', name: "蚂蚁", name_en: "Ant", emoji: "🐜", sound: "吱吱" },
    Animal { letter: 'B', name: "熊", name_en: "Bear", emoji: "🐻", sound: "吼吼" },
    Animal { letter: 'C', name: "猫", name_en: "Cat", emoji: "🐱", sound: "喵喵" },
    Animal { letter: 'D', name: "狗", name_en: "Dog", emoji: "🐕", sound: "汪汪" },
    Animal { letter: 'E', name: "大象", name_en: "Elephant", emoji: "🐘", sound: "呜呜" },
    Animal { letter: 'F', name: "青蛙", name_en: "Frog", emoji: "🐸", sound: "呱呱" },
    Animal { letter: 'G', name: "长颈鹿", name_en: "Giraffe", emoji: "🦒", sound: "嗯嗯" },
    Animal { letter: 'H', name: "河马", name_en: "Hippo", emoji: "🦛", sound: "哼哼" },
    Animal { letter: 'I', name: "鬣蜥", name_en: "Iguana", emoji: "🦎", sound: "嘶嘶" },
    Animal { letter: 'J', name: "水母", name_en: "Jellyfish", emoji: "🪼", sound: "咕噜" },
    Animal { letter: 'K', name: "袋鼠", name_en: "Kangaroo", emoji: "🦘", sound: "咚咚" },
    Animal { letter: 'L', name: "狮子", name_en: "Lion", emoji: "🦁", sound: "嗷呜" },
    Animal { letter: 'M', name: "猴子", name_en: "Monkey", emoji: "🐵", sound: "吱吱" },
    Animal { letter: 'N', name: "夜莺", name_en: "Nightingale", emoji: "🐦", sound: "啾啾" },
    Animal { letter: 'O', name: "猫头鹰", name_en: "Owl", emoji: "🦉", sound: "咕咕" },
    Animal { letter: 'P', name: "熊猫", name_en: "Panda", emoji: "🐼", sound: "哼哼" },
    Animal { letter: 'Q', name: "鹌鹑", name_en: "Quail", emoji: "🐔", sound: "哔哔" },
    Animal { letter: 'R', name: "兔子", name_en: "Rabbit", emoji: "🐰", sound: "咕咕" },
    Animal { letter: 'S', name: "蛇", name_en: "Snake", emoji: "🐍", sound: "嘶嘶" },
    Animal { letter: 'T', name: "老虎", name_en: "Tiger", emoji: "🐯", sound: "嗷呜" },
    Animal { letter: 'U', name: "独角兽", name_en: "Unicorn", emoji: "🦄", sound: "咴咴" },
    Animal { letter: 'V', name: "秃鹫", name_en: "Vulture", emoji: "🦅", sound: "嘎嘎" },
    Animal { letter: 'W', name: "鲸鱼", name_en: "Whale", emoji: "🐋", sound: "嗡嗡" },
    Animal { letter: 'X', name: "X射线鱼", name_en: "X-ray Fish", emoji: "🐟", sound: "咕嘟" },
    Animal { letter: 'Y', name: "牦牛", name_en: "Yak", emoji: "🐄", sound: "哞哞" },
    Animal { letter: 'Z', name: "斑马", name_en: "Zebra", emoji: "🦓", sound: "嘶鸣" },
];

/// Look up the catalog entry for an (uppercase) letter.
pub fn animal_for(catalog: &'static [Animal], letter: char) -> Option<&'static Animal> {
    catalog.iter().find(|a| a.letter == letter)
}

/// Pick a random animal whose letter is not in `exclude`. Returns `None` when
/// the exclusion set covers the whole catalog. `pick` maps a slice length to
/// an index in `0..len` (injected so tests stay deterministic).
pub fn pick_random(
    catalog: &'static [Animal],
    exclude: &[char],
    pick: &mut dyn FnMut(usize) -> usize,
) -> Option<&'static Animal> {
    let available: Vec<&'static Animal> = catalog
        .iter()
        .filter(|a| !exclude.contains(&a.letter))
        .collect();
    if available.is_empty() {
        return None;
    }
    let idx = pick(available.len()) % available.len();
    Some(available[idx])
}

/// Derive the audio asset identifier for a cue text: URL-safe base64 of the
/// UTF-8 bytes with padding trimmed. Assets are served as `<id>.mp3`.
pub fn audio_identifier(text: &str) -> String {
    URL_SAFE_NO_PAD.encode(text.as_bytes())
}

/// Full asset path for a cue text under the host's audio directory.
pub fn audio_url(text: &str) -> String {
    format!("/audio/{}.mp3", audio_identifier(text))
}
