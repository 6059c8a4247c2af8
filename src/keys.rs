use std::fmt;
use std::str::FromStr;

use crate::error::KeyComboError;



/// Win32 virtual-key code .. kept as a plain u16 so the combos can be parsed and tested off-windows
pub type VKey = u16;

pub const VK_TAB     : VKey = 0x09;
pub const VK_RETURN  : VKey = 0x0D;
pub const VK_SHIFT   : VKey = 0x10;
pub const VK_CONTROL : VKey = 0x11;
pub const VK_MENU    : VKey = 0x12;
pub const VK_ESCAPE  : VKey = 0x1B;
pub const VK_SPACE   : VKey = 0x20;
pub const VK_PRIOR   : VKey = 0x21;
pub const VK_NEXT    : VKey = 0x22;
pub const VK_LWIN    : VKey = 0x5B;
pub const VK_F1      : VKey = 0x70;



# [ derive (Debug, Clone, PartialEq, Eq) ]
/// A key combination like `ctrl+tab`, held down in order and released in reverse
pub struct KeyCombo {
    keys : Vec <VKey>,
}

impl KeyCombo {
    pub fn keys (&self) -> &[VKey] { &self.keys }
}


fn parse_key (name:&str) -> Option<VKey> {
    let key = match name {
        "ctrl" | "control"        => VK_CONTROL,
        "alt"  | "menu"           => VK_MENU,
        "shift"                   => VK_SHIFT,
        "win"  | "super" | "meta" => VK_LWIN,
        "tab"                     => VK_TAB,
        "enter" | "return"        => VK_RETURN,
        "esc" | "escape"          => VK_ESCAPE,
        "space"                   => VK_SPACE,
        "pgup" | "pageup"         => VK_PRIOR,
        "pgdn" | "pagedown"       => VK_NEXT,
        _ => {
            let mut chars = name.chars();
            return match (chars.next(), chars.next()) {
                // digits and letters share their ascii (upper-case) codes
                (Some(c), None) if c.is_ascii_digit()      => Some (c as VKey),
                (Some(c), None) if c.is_ascii_alphabetic() => Some (c.to_ascii_uppercase() as VKey),
                (Some('f'), Some(_)) => {
                    name[1..].parse::<u16>().ok() .filter (|n| (1..=24).contains(n)) .map (|n| VK_F1 + n - 1)
                }
                _ => None
            }
        }
    };
    Some(key)
}


impl FromStr for KeyCombo {
    type Err = KeyComboError;

    fn from_str (s:&str) -> Result<Self, Self::Err> {
        let names = s .split('+') .map (|k| k.trim().to_lowercase()) .filter (|k| !k.is_empty()) .collect::<Vec<_>>();
        if names.is_empty() { return Err (KeyComboError::Empty) }
        let keys = names .iter() .map ( |n|
            parse_key(n) .ok_or_else (|| KeyComboError::UnknownKey (n.clone()))
        ) .collect::<Result<Vec<_>,_>>()?;
        Ok ( KeyCombo { keys } )
    }
}

impl fmt::Display for KeyCombo {
    fn fmt (&self, f:&mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.keys .iter() .map (|k| format!("{:#04X}", k)) .collect::<Vec<_>>() .join("+");
        write!(f, "{}", s)
    }
}
