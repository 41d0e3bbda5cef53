//! Conversion des événements clavier Winit vers les types Servo.
//!
//! Servo utilise les types de `keyboard_types` (ré-exportés depuis `servo::`),
//! Winit a les siens dans `winit::keyboard`. Seules les touches utiles à la
//! navigation et à la saisie sont traduites ; le reste devient
//! `Unidentified`, que Servo ignore.

use servo::{Code, Key, KeyState, KeyboardEvent, Location, Modifiers, NamedKey};
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{
    Key as WinitKey, KeyCode, KeyLocation as WinitKeyLocation, ModifiersState,
    NamedKey as WinitNamedKey, PhysicalKey,
};

/// Génère un `match` où chaque variante porte le même nom des deux côtés,
/// suivi de bras supplémentaires écrits à la main.
macro_rules! same_name {
    ($value:expr, $from:ident => $to:ident, [$($variant:ident),* $(,)?], { $($extra:tt)* }) => {
        match $value {
            $($from::$variant => $to::$variant,)*
            $($extra)*
        }
    };
}

/// Convertit un `KeyEvent` Winit + état des modificateurs en `KeyboardEvent` Servo.
pub fn keyboard_event_from_winit(key_event: &KeyEvent, state: ModifiersState) -> KeyboardEvent {
    KeyboardEvent::new_without_event(
        key_state_from_winit(key_event.state),
        key_from_winit(&key_event.logical_key),
        code_from_winit(&key_event.physical_key),
        location_from_winit(key_event.location),
        modifiers_from_winit(state),
        key_event.repeat,
        false,
    )
}

fn key_state_from_winit(state: ElementState) -> KeyState {
    match state {
        ElementState::Pressed => KeyState::Down,
        ElementState::Released => KeyState::Up,
    }
}

fn key_from_winit(logical_key: &WinitKey) -> Key {
    match logical_key {
        WinitKey::Character(string) => Key::Character(string.to_string()),
        // Servo attend l'espace sous forme de caractère.
        WinitKey::Named(WinitNamedKey::Space) => Key::Character(" ".to_string()),
        WinitKey::Named(named) => Key::Named(named_key_from_winit(*named)),
        WinitKey::Unidentified(_) | WinitKey::Dead(_) => Key::Named(NamedKey::Unidentified),
    }
}

#[allow(deprecated)]
fn named_key_from_winit(named: WinitNamedKey) -> NamedKey {
    same_name!(named, WinitNamedKey => NamedKey, [
        Alt, AltGraph, CapsLock, Control, Fn, NumLock, ScrollLock, Shift,
        Enter, Tab, ArrowDown, ArrowLeft, ArrowRight, ArrowUp, End, Home, PageDown, PageUp,
        Backspace, Clear, Copy, Cut, Delete, Insert, Paste, Redo, Undo,
        ContextMenu, Escape, Pause, PrintScreen, BrowserBack, BrowserForward,
        BrowserHome, BrowserRefresh,
        F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
    ], {
        WinitNamedKey::Super | WinitNamedKey::Meta => NamedKey::Meta,
        _ => NamedKey::Unidentified,
    })
}

fn location_from_winit(location: WinitKeyLocation) -> Location {
    match location {
        WinitKeyLocation::Standard => Location::Standard,
        WinitKeyLocation::Left => Location::Left,
        WinitKeyLocation::Right => Location::Right,
        WinitKeyLocation::Numpad => Location::Numpad,
    }
}

fn code_from_winit(physical_key: &PhysicalKey) -> Code {
    let PhysicalKey::Code(code) = physical_key else {
        return Code::Unidentified;
    };
    same_name!(*code, KeyCode => Code, [
        KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI, KeyJ, KeyK, KeyL, KeyM,
        KeyN, KeyO, KeyP, KeyQ, KeyR, KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,
        Digit0, Digit1, Digit2, Digit3, Digit4, Digit5, Digit6, Digit7, Digit8, Digit9,
        Backquote, Backslash, BracketLeft, BracketRight, Comma, Equal, Minus, Period,
        Quote, Semicolon, Slash, Space, Enter, Tab, Backspace, Delete, Escape, Insert,
        ArrowDown, ArrowLeft, ArrowRight, ArrowUp, End, Home, PageDown, PageUp,
        ShiftLeft, ShiftRight, ControlLeft, ControlRight, AltLeft, AltRight, CapsLock,
        F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
    ], {
        KeyCode::SuperLeft => Code::MetaLeft,
        KeyCode::SuperRight => Code::MetaRight,
        _ => Code::Unidentified,
    })
}

fn modifiers_from_winit(mods: ModifiersState) -> Modifiers {
    let mut modifiers = Modifiers::empty();
    modifiers.set(Modifiers::CONTROL, mods.control_key());
    modifiers.set(Modifiers::SHIFT, mods.shift_key());
    modifiers.set(Modifiers::ALT, mods.alt_key());
    modifiers.set(Modifiers::META, mods.super_key());
    modifiers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_state() {
        assert_eq!(key_state_from_winit(ElementState::Pressed), KeyState::Down);
        assert_eq!(key_state_from_winit(ElementState::Released), KeyState::Up);
    }

    #[test]
    fn test_character_key() {
        let key = key_from_winit(&WinitKey::Character("a".into()));
        assert_eq!(key, Key::Character("a".to_string()));
    }

    #[test]
    fn test_space_becomes_character() {
        let key = key_from_winit(&WinitKey::Named(WinitNamedKey::Space));
        assert_eq!(key, Key::Character(" ".to_string()));
    }

    #[test]
    fn test_named_keys() {
        assert_eq!(
            key_from_winit(&WinitKey::Named(WinitNamedKey::Enter)),
            Key::Named(NamedKey::Enter)
        );
        assert_eq!(
            key_from_winit(&WinitKey::Named(WinitNamedKey::F5)),
            Key::Named(NamedKey::F5)
        );
        assert_eq!(
            key_from_winit(&WinitKey::Named(WinitNamedKey::Super)),
            Key::Named(NamedKey::Meta)
        );
    }

    #[test]
    fn test_unmapped_named_key_is_unidentified() {
        assert_eq!(
            key_from_winit(&WinitKey::Named(WinitNamedKey::TVPower)),
            Key::Named(NamedKey::Unidentified)
        );
    }

    #[test]
    fn test_codes() {
        assert_eq!(code_from_winit(&PhysicalKey::Code(KeyCode::KeyL)), Code::KeyL);
        assert_eq!(
            code_from_winit(&PhysicalKey::Code(KeyCode::SuperLeft)),
            Code::MetaLeft
        );
        assert_eq!(
            code_from_winit(&PhysicalKey::Code(KeyCode::NumpadHash)),
            Code::Unidentified
        );
    }

    #[test]
    fn test_location() {
        assert_eq!(location_from_winit(WinitKeyLocation::Left), Location::Left);
        assert_eq!(location_from_winit(WinitKeyLocation::Numpad), Location::Numpad);
    }

    #[test]
    fn test_modifiers() {
        let mods = modifiers_from_winit(ModifiersState::CONTROL | ModifiersState::SHIFT);
        assert!(mods.contains(Modifiers::CONTROL));
        assert!(mods.contains(Modifiers::SHIFT));
        assert!(!mods.contains(Modifiers::ALT));
        assert!(!mods.contains(Modifiers::META));
    }
}
