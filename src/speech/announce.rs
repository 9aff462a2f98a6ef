// Spoken forms of note names, chord symbols and scale-degree labels.

use crate::theory::Pitch;

const SOLFEGE: [&str; 7] = ["Do", "Re", "Mi", "Fa", "Sol", "La", "Si"];
// natural pitch classes in order C D E F G A B
const NATURALS: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

// Turn a note or chord symbol into words a speech engine reads correctly.
//
// "F#m7"  -> "F sharp minor 7"
// "C4"    -> "C 4"
// "Bb/F"  -> "B flat over F"
//
// Anything that does not parse as a symbol (solfège, numerals, free text)
// comes back unchanged apart from `#` and `/`.
pub fn render(symbol: &str) -> String {
    match render_symbol(symbol.trim()) {
        Some(words) => words.join(" "),
        None => symbol.replace('#', " sharp ").replace('/', " over "),
    }
}

fn render_symbol(symbol: &str) -> Option<Vec<String>> {
    let (upper, bass) = match symbol.split_once('/') {
        Some((upper, bass)) => (upper, Some(bass)),
        None => (symbol, None),
    };

    let (mut words, rest) = root_words(upper)?;

    if !rest.is_empty() {
        if is_octave(rest) {
            words.push(rest.to_string());
        } else {
            words.extend(quality_words(rest)?);
        }
    }

    if let Some(bass) = bass {
        let (bass_words, bass_rest) = root_words(bass)?;
        if !bass_rest.is_empty() {
            return None;
        }
        words.push("over".to_string());
        words.extend(bass_words);
    }
    Some(words)
}

// "F#..." -> (["F", "sharp"], "...")
fn root_words(s: &str) -> Option<(Vec<String>, &str)> {
    let letter = s.chars().next().filter(|c| ('A'..='G').contains(c))?;
    let mut words = vec![letter.to_string()];
    let rest = &s[1..];
    let rest = if let Some(r) = rest.strip_prefix('#') {
        words.push("sharp".into());
        r
    } else if let Some(r) = rest.strip_prefix('b') {
        words.push("flat".into());
        r
    } else {
        rest
    };
    Some((words, rest))
}

fn is_octave(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn quality_words(mut s: &str) -> Option<Vec<String>> {
    const WORDS: [(&str, &str); 8] = [
        ("maj", "major"),
        ("min", "minor"),
        ("sus", "suspended"),
        ("dim", "diminished"),
        ("aug", "augmented"),
        ("add", "add"),
        ("m", "minor"),
        ("+", "augmented"),
    ];

    let mut words = Vec::new();
    'scan: while !s.is_empty() {
        for (token, word) in WORDS {
            if let Some(rest) = s.strip_prefix(token) {
                words.push(word.to_string());
                s = rest;
                continue 'scan;
            }
        }
        let digits = s.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 {
            words.push(s[..digits].to_string());
            s = &s[digits..];
            continue;
        }
        // altered extensions: m7b5, 7#9
        let word = match s.as_bytes()[0] {
            b'b' => "flat",
            b'#' => "sharp",
            _ => return None,
        };
        words.push(word.to_string());
        s = &s[1..];
    }
    Some(words)
}

// Speaking rate for a slowness factor: 2 means half speed.
pub fn speaking_rate(slowness: f32) -> f32 {
    if slowness > 0.0 && slowness.is_finite() {
        1.0 / slowness
    } else {
        1.0
    }
}

// Solfège syllable for the symbol's pitch class ("F#4" -> "raised Fa").
pub fn solfege(symbol: &str) -> Option<String> {
    degree_label(symbol, |i| SOLFEGE[i].to_string())
}

// Scale-degree numeral relative to C ("E" -> "3", "C#" -> "raised 1").
pub fn numeral(symbol: &str) -> Option<String> {
    degree_label(symbol, |i| (i + 1).to_string())
}

fn degree_label(symbol: &str, label: impl Fn(usize) -> String) -> Option<String> {
    let (class, _) = Pitch::parse_class(symbol.trim())?;
    if let Some(i) = NATURALS.iter().position(|n| *n == class) {
        return Some(label(i));
    }
    // not a natural, so one semitone above one
    let i = NATURALS.iter().position(|n| *n == class - 1)?;
    Some(format!("raised {}", label(i)))
}
