// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Key translation through the compositor's XKB keymap.
//!
//! The compositor sends its keymap as a file descriptor; it is compiled with
//! xkbcommon and updated from `wl_keyboard.modifiers`, so the viewer sees
//! the characters the user's layout produces. Navigation keys are reported
//! as [`NavKey`]s and get their command meaning in the run loop.

use std::fmt;
use std::fs::File;
use std::io::{self, ErrorKind};
use std::os::fd::OwnedFd;
use std::os::unix::fs::FileExt;

use lectern_core::event::{Event, Modifiers, NavKey};
use xkbcommon::xkb;
use xkbcommon::xkb::keysyms;

/// XKB keycodes are evdev codes plus 8.
const EVDEV_OFFSET: u32 = 8;

/// Keymap and modifier state of the seat's keyboard.
pub(crate) struct Keyboard {
    context: xkb::Context,
    state: Option<xkb::State>,
    modifiers: Modifiers,
}

impl Default for Keyboard {
    fn default() -> Self {
        Self {
            context: xkb::Context::new(xkb::CONTEXT_NO_FLAGS),
            state: None,
            modifiers: Modifiers::NONE,
        }
    }
}

impl fmt::Debug for Keyboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyboard")
            .field("loaded", &self.state.is_some())
            .field("modifiers", &self.modifiers)
            .finish_non_exhaustive()
    }
}

impl Keyboard {
    /// Compiles the keymap sent in `wl_keyboard.keymap`.
    pub(crate) fn load_fd(&mut self, fd: OwnedFd, size: u32) {
        match read_keymap(fd, size) {
            Ok(text) => {
                self.load(text);
            }
            Err(err) => log::warn!("cannot read the compositor keymap: {err}"),
        }
    }

    /// Compiles `text`. On failure the previous keymap stays in use.
    pub(crate) fn load(&mut self, text: String) -> bool {
        let keymap = xkb::Keymap::new_from_string(
            &self.context,
            text,
            xkb::KEYMAP_FORMAT_TEXT_V1,
            xkb::KEYMAP_COMPILE_NO_FLAGS,
        );
        match keymap {
            Some(keymap) => {
                self.state = Some(xkb::State::new(&keymap));
                self.modifiers = Modifiers::NONE;
                true
            }
            None => {
                log::warn!("compositor keymap does not compile; keeping the previous one");
                false
            }
        }
    }

    pub(crate) fn update_modifiers(&mut self, depressed: u32, latched: u32, locked: u32, group: u32) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        state.update_mask(depressed, latched, locked, 0, 0, group);
        self.modifiers = Modifiers {
            shift: state.mod_name_is_active(xkb::MOD_NAME_SHIFT, xkb::STATE_MODS_EFFECTIVE),
            ctrl: state.mod_name_is_active(xkb::MOD_NAME_CTRL, xkb::STATE_MODS_EFFECTIVE),
        };
    }

    pub(crate) const fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Translates a pressed evdev key. `None` before the first keymap and for
    /// keys that type nothing, such as modifiers.
    pub(crate) fn press(&self, key: u32) -> Option<Event> {
        let state = self.state.as_ref()?;
        let code = xkb::Keycode::new(key.checked_add(EVDEV_OFFSET)?);
        let sym = state.key_get_one_sym(code);
        let modifiers = self.modifiers;
        // Control maps letters to control codes; Ctrl+C must still read `c`.
        let utf32 = if modifiers.ctrl {
            xkb::keysym_to_utf32(sym)
        } else {
            state.key_get_utf32(code)
        };
        let text = char::from_u32(utf32).filter(|&c| c != '\0');
        match nav_key(sym) {
            Some(key) => Some(Event::NavKey {
                key,
                text,
                modifiers,
            }),
            None => text.map(|code| Event::Key { code, modifiers }),
        }
    }
}

fn nav_key(sym: xkb::Keysym) -> Option<NavKey> {
    Some(match sym.raw() {
        keysyms::KEY_Escape => NavKey::Escape,
        keysyms::KEY_Up => NavKey::Up,
        keysyms::KEY_Down => NavKey::Down,
        keysyms::KEY_Left => NavKey::Left,
        keysyms::KEY_Right => NavKey::Right,
        keysyms::KEY_Page_Up => NavKey::PageUp,
        keysyms::KEY_Page_Down => NavKey::PageDown,
        keysyms::KEY_Home => NavKey::Home,
        keysyms::KEY_End => NavKey::End,
        _ => return None,
    })
}

/// Reads the NUL-terminated keymap text. Positional reads leave the file
/// offset alone, which may be shared with other clients.
fn read_keymap(fd: OwnedFd, size: u32) -> io::Result<String> {
    let len = usize::try_from(size).map_err(|err| io::Error::new(ErrorKind::InvalidData, err))?;
    let mut bytes = vec![0_u8; len];
    File::from(fd).read_exact_at(&mut bytes, 0)?;
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    bytes.truncate(end);
    String::from_utf8(bytes).map_err(|err| io::Error::new(ErrorKind::InvalidData, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_ESC: u32 = 1;
    const KEY_A: u32 = 30;
    const KEY_C: u32 = 46;
    const KEY_UP: u32 = 103;
    const MOD_SHIFT: u32 = 1 << 0;
    const MOD_CTRL: u32 = 1 << 2;

    /// A tiny keymap whose `<AC01>` key (evdev `KEY_A`) types `home_row`.
    fn keymap(home_row: &str) -> String {
        let upper = home_row.to_uppercase();
        format!(
            r#"xkb_keymap {{
    xkb_keycodes "lectern" {{
        minimum = 8;
        maximum = 255;
        <ESC> = 9;
        <AC01> = 38;
        <AB03> = 54;
        <UP> = 111;
    }};
    xkb_types "lectern" {{
        type "ONE_LEVEL" {{
            modifiers = none;
            level_name[Level1] = "Any";
        }};
        type "TWO_LEVEL" {{
            modifiers = Shift;
            map[Shift] = Level2;
            level_name[Level1] = "Base";
            level_name[Level2] = "Shift";
        }};
        type "ALPHABETIC" {{
            modifiers = Shift + Lock;
            map[Shift] = Level2;
            map[Lock] = Level2;
            level_name[Level1] = "Base";
            level_name[Level2] = "Caps";
        }};
    }};
    xkb_compatibility "lectern" {{
        interpret Shift_L {{ action = SetMods(modifiers = Shift); }};
        interpret Control_L {{ action = SetMods(modifiers = Control); }};
    }};
    xkb_symbols "lectern" {{
        key <ESC> {{ [ Escape ] }};
        key <AC01> {{ [ {home_row}, {upper} ] }};
        key <AB03> {{ [ c, C ] }};
        key <UP> {{ [ Up ] }};
    }};
}};
"#
        )
    }

    fn loaded(home_row: &str) -> Keyboard {
        let mut keyboard = Keyboard::default();
        assert!(keyboard.load(keymap(home_row)), "test keymap compiles");
        keyboard
    }

    fn typed(keyboard: &Keyboard, key: u32) -> Option<char> {
        match keyboard.press(key) {
            Some(Event::Key { code, .. }) => Some(code),
            _ => None,
        }
    }

    #[test]
    fn nothing_is_typed_before_a_keymap_arrives() {
        assert_eq!(Keyboard::default().press(KEY_A), None);
    }

    #[test]
    fn characters_follow_the_compositor_layout() {
        assert_eq!(typed(&loaded("a"), KEY_A), Some('a'));
        assert_eq!(typed(&loaded("q"), KEY_A), Some('q'), "AZERTY home row");
    }

    #[test]
    fn shift_selects_the_second_level() {
        let mut keyboard = loaded("a");
        keyboard.update_modifiers(MOD_SHIFT, 0, 0, 0);
        assert!(keyboard.modifiers().shift);
        assert_eq!(typed(&keyboard, KEY_A), Some('A'));
    }

    #[test]
    fn ctrl_c_reads_as_c() {
        let mut keyboard = loaded("a");
        keyboard.update_modifiers(MOD_CTRL, 0, 0, 0);
        assert_eq!(
            keyboard.press(KEY_C),
            Some(Event::Key {
                code: 'c',
                modifiers: Modifiers::CTRL
            })
        );
    }

    #[test]
    fn navigation_keys_carry_their_text() {
        let keyboard = loaded("a");
        assert_eq!(
            keyboard.press(KEY_UP),
            Some(Event::NavKey {
                key: NavKey::Up,
                text: None,
                modifiers: Modifiers::NONE
            })
        );
        assert_eq!(
            keyboard.press(KEY_ESC),
            Some(Event::NavKey {
                key: NavKey::Escape,
                text: Some('\x1b'),
                modifiers: Modifiers::NONE
            })
        );
    }

    #[test]
    fn broken_keymap_keeps_the_previous_one() {
        let mut keyboard = loaded("a");
        assert!(!keyboard.load(String::from("xkb_keymap { nonsense")));
        assert_eq!(typed(&keyboard, KEY_A), Some('a'));
    }

    #[test]
    fn keymap_text_stops_at_nul() {
        let fd = rustix::fs::memfd_create("lectern-keymap-test", rustix::fs::MemfdFlags::CLOEXEC)
            .unwrap();
        let file = File::from(fd);
        file.write_all_at(b"xkb_keymap {};\0\0", 0).unwrap();
        let text = read_keymap(OwnedFd::from(file), 16).unwrap();
        assert_eq!(text, "xkb_keymap {};");
    }
}
