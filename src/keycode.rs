//! Canonical key-code classification.
//!
//! Every place that needs to interpret a raw key code (the capture dialog,
//! the conflict check, the OS accelerator conversion) goes through this one
//! table. Canonical keys are opaque beyond equality: digits are stored as the
//! digit itself, letters and numpad digits as the raw code, function and
//! special keys by name. The display strings match the original soundboard UI
//! (fixed zh_CN locale).

use global_hotkey::hotkey::Code;

/// A recognized key: the canonical identifier persisted in the store and the
/// human-readable label shown in the UI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyInfo {
    pub canonical: String,
    pub display: String,
}

impl KeyInfo {
    fn new(canonical: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            canonical: canonical.into(),
            display: display.into(),
        }
    }
}

/// Classify a raw platform key code. Returns `None` for anything outside the
/// bindable set; callers treat that as "keep listening", never as an error.
pub fn translate(raw: u32) -> Option<KeyInfo> {
    match raw {
        // Numpad digits keep their raw code so they stay distinct from the
        // main row.
        96..=105 => Some(KeyInfo::new(
            raw.to_string(),
            format!("小键盘{}", raw - 96),
        )),
        // Main-row digits canonicalize to the digit value itself.
        48..=57 => {
            let digit = (raw - 48).to_string();
            Some(KeyInfo::new(digit.clone(), digit))
        }
        // Letters keep the raw code; display is the letter.
        65..=90 => {
            let letter = char::from_u32(raw)?;
            Some(KeyInfo::new(raw.to_string(), letter.to_string()))
        }
        // F1-F12.
        112..=123 => {
            let name = format!("F{}", raw - 111);
            Some(KeyInfo::new(name.clone(), name))
        }
        _ => special_key(raw),
    }
}

/// Fixed table of named special keys. Named canonicals keep these disjoint
/// from the digit canonicals ("8" the digit vs Backspace, code 8).
fn special_key(raw: u32) -> Option<KeyInfo> {
    let (canonical, display) = match raw {
        32 => ("Space", "空格"),
        13 => ("Enter", "回车"),
        9 => ("Tab", "Tab"),
        27 => ("Esc", "Esc"),
        8 => ("Backspace", "退格"),
        46 => ("Delete", "Delete"),
        45 => ("Insert", "Insert"),
        36 => ("Home", "Home"),
        35 => ("End", "End"),
        33 => ("PageUp", "PageUp"),
        34 => ("PageDown", "PageDown"),
        37 => ("Left", "←"),
        38 => ("Up", "↑"),
        39 => ("Right", "→"),
        40 => ("Down", "↓"),
        106 => ("NumMultiply", "小键盘 *"),
        107 => ("NumAdd", "小键盘 +"),
        109 => ("NumSubtract", "小键盘 -"),
        110 => ("NumDecimal", "小键盘 ."),
        111 => ("NumDivide", "小键盘 /"),
        186 => ("Semicolon", ";"),
        187 => ("Equal", "="),
        188 => ("Comma", ","),
        189 => ("Minus", "-"),
        190 => ("Period", "."),
        191 => ("Slash", "/"),
        192 => ("Backquote", "`"),
        219 => ("BracketLeft", "["),
        220 => ("Backslash", "\\"),
        221 => ("BracketRight", "]"),
        222 => ("Quote", "'"),
        _ => return None,
    };
    Some(KeyInfo::new(canonical, display))
}

/// Map a canonical key (as persisted by the store) to the OS accelerator
/// code. Every key `translate` can produce has a code here.
pub fn accelerator_code(canonical: &str) -> Option<Code> {
    let code = match canonical {
        "0" => Code::Digit0,
        "1" => Code::Digit1,
        "2" => Code::Digit2,
        "3" => Code::Digit3,
        "4" => Code::Digit4,
        "5" => Code::Digit5,
        "6" => Code::Digit6,
        "7" => Code::Digit7,
        "8" => Code::Digit8,
        "9" => Code::Digit9,
        "F1" => Code::F1,
        "F2" => Code::F2,
        "F3" => Code::F3,
        "F4" => Code::F4,
        "F5" => Code::F5,
        "F6" => Code::F6,
        "F7" => Code::F7,
        "F8" => Code::F8,
        "F9" => Code::F9,
        "F10" => Code::F10,
        "F11" => Code::F11,
        "F12" => Code::F12,
        "Space" => Code::Space,
        "Enter" => Code::Enter,
        "Tab" => Code::Tab,
        "Esc" => Code::Escape,
        "Backspace" => Code::Backspace,
        "Delete" => Code::Delete,
        "Insert" => Code::Insert,
        "Home" => Code::Home,
        "End" => Code::End,
        "PageUp" => Code::PageUp,
        "PageDown" => Code::PageDown,
        "Left" => Code::ArrowLeft,
        "Up" => Code::ArrowUp,
        "Right" => Code::ArrowRight,
        "Down" => Code::ArrowDown,
        "NumMultiply" => Code::NumpadMultiply,
        "NumAdd" => Code::NumpadAdd,
        "NumSubtract" => Code::NumpadSubtract,
        "NumDecimal" => Code::NumpadDecimal,
        "NumDivide" => Code::NumpadDivide,
        "Semicolon" => Code::Semicolon,
        "Equal" => Code::Equal,
        "Comma" => Code::Comma,
        "Minus" => Code::Minus,
        "Period" => Code::Period,
        "Slash" => Code::Slash,
        "Backquote" => Code::Backquote,
        "BracketLeft" => Code::BracketLeft,
        "Backslash" => Code::Backslash,
        "BracketRight" => Code::BracketRight,
        "Quote" => Code::Quote,
        numeric => match numeric.parse::<u32>().ok()? {
            96 => Code::Numpad0,
            97 => Code::Numpad1,
            98 => Code::Numpad2,
            99 => Code::Numpad3,
            100 => Code::Numpad4,
            101 => Code::Numpad5,
            102 => Code::Numpad6,
            103 => Code::Numpad7,
            104 => Code::Numpad8,
            105 => Code::Numpad9,
            65 => Code::KeyA,
            66 => Code::KeyB,
            67 => Code::KeyC,
            68 => Code::KeyD,
            69 => Code::KeyE,
            70 => Code::KeyF,
            71 => Code::KeyG,
            72 => Code::KeyH,
            73 => Code::KeyI,
            74 => Code::KeyJ,
            75 => Code::KeyK,
            76 => Code::KeyL,
            77 => Code::KeyM,
            78 => Code::KeyN,
            79 => Code::KeyO,
            80 => Code::KeyP,
            81 => Code::KeyQ,
            82 => Code::KeyR,
            83 => Code::KeyS,
            84 => Code::KeyT,
            85 => Code::KeyU,
            86 => Code::KeyV,
            87 => Code::KeyW,
            88 => Code::KeyX,
            89 => Code::KeyY,
            90 => Code::KeyZ,
            _ => return None,
        },
    };
    Some(code)
}
