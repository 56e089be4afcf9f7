//! Scan-code table for standard PC keyboards.
//!
//! Maps Linux key codes to the semantic names the keyboard dispatch uses.

/// Semantic name of a key code, `None` if the code is not on the keyboard.
pub fn key_name(code: u16) -> Option<&'static str> {
    let name = match code {
        1 => "escape",
        2 => "1",
        3 => "2",
        4 => "3",
        5 => "4",
        6 => "5",
        7 => "6",
        8 => "7",
        9 => "8",
        10 => "9",
        11 => "0",
        12 => "-_",
        13 => "=+",
        14 => "backspace",
        15 => "tab",
        16 => "q",
        17 => "w",
        18 => "e",
        19 => "r",
        20 => "t",
        21 => "y",
        22 => "u",
        23 => "i",
        24 => "o",
        25 => "p",
        26 => "[",
        27 => "]",
        28 => "enter",
        29 => "left_ctrl",
        30 => "a",
        31 => "s",
        32 => "d",
        33 => "f",
        34 => "g",
        35 => "h",
        36 => "j",
        37 => "k",
        38 => "l",
        39 => ";",
        40 => "'",
        41 => "`",
        42 => "left_shift",
        43 => "\\",
        44 => "z",
        45 => "x",
        46 => "c",
        47 => "v",
        48 => "b",
        49 => "n",
        50 => "m",
        51 => ",",
        52 => ".",
        53 => "/",
        54 => "right_shift",
        55 => "right_*",
        56 => "left_alt",
        57 => "space",
        58 => "capslock",
        59 => "f1",
        60 => "f2",
        61 => "f3",
        62 => "f4",
        63 => "f5",
        64 => "f6",
        65 => "f7",
        66 => "f8",
        67 => "f9",
        68 => "f10",
        69 => "numlock",
        70 => "scrolllock",
        71 => "keypad_7",
        72 => "keypad_8",
        73 => "keypad_9",
        74 => "keypad_-",
        75 => "keypad_4",
        76 => "keypad_5",
        77 => "keypad_6",
        78 => "keypad_+",
        79 => "keypad_1",
        80 => "keypad_2",
        81 => "keypad_3",
        82 => "keypad_0",
        83 => "keypad_.",
        96 => "keypad_enter",
        97 => "right_ctrl",
        98 => "keypad_/",
        100 => "right_alt",
        102 => "home",
        103 => "arrow_up",
        104 => "pageup",
        105 => "arrow_left",
        106 => "arrow_right",
        107 => "end",
        108 => "arrow_down",
        109 => "pagedown",
        110 => "insert",
        111 => "delete",
        125 => "super",
        _ => return None,
    };
    Some(name)
}
