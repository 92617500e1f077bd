// Keycombo Keymap File Tests
//
// Hand-written keymap documents loaded through the store and the bridge,
// covering damaged files and the round trip back to disk.

use std::fs;

use keycombo_core::{
    Combo, ComboBridge, ComboEngine, ComboRecord, ComboStore, Disposition, EngineSettings, KeyEvent,
    Modifiers, NativeKeymap, Scancode, StoreError,
};
use tempfile::TempDir;

const TWO_COMBOS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<userKeyCombos>
    <userKeyCombo>
        <in>
            <mod>KMOD_CTRL|KMOD_ALT</mod>
            <code>SDL_SCANCODE_F2</code>
        </in>
        <outArr>
            <out>
                <mod>KMOD_LCTRL|KMOD_LSHIFT</mod>
                <code>SDL_SCANCODE_DELETE</code>
            </out>
            <out>
                <mod>KMOD_LCTRL|KMOD_LSHIFT</mod>
                <code>SDL_SCANCODE_L</code>
            </out>
        </outArr>
    </userKeyCombo>
    <userKeyCombo>
        <in>
            <mod></mod>
            <code>SDL_SCANCODE_F3</code>
        </in>
        <description>swallow F3</description>
        <outArr/>
    </userKeyCombo>
</userKeyCombos>
"#;

fn write_keymap(dir: &TempDir, xml: &str) -> ComboStore {
    let path = dir.path().join("keymap.xml");
    fs::write(&path, xml).unwrap();
    ComboStore::with_path(path)
}

#[test]
fn test_hand_written_document_loads() {
    let dir = TempDir::new().unwrap();
    let mut store = write_keymap(&dir, TWO_COMBOS);

    let report = store.load().unwrap();
    assert_eq!(report.loaded, 2);
    assert!(report.is_clean());

    let combos = store.combos();
    assert_eq!(combos[0].input.modifiers, vec!["KMOD_CTRL", "KMOD_ALT"]);
    assert_eq!(combos[0].outputs.len(), 2);
    assert!(combos[0].description.is_empty());
    assert!(combos[1].is_blocker());
    assert_eq!(combos[1].description, "swallow F3");
}

#[test]
fn test_element_damage_is_skipped_and_counted() {
    let dir = TempDir::new().unwrap();
    let damaged = TWO_COMBOS.replacen(
        "<in>\n            <mod>KMOD_CTRL|KMOD_ALT</mod>\n            <code>SDL_SCANCODE_F2</code>\n        </in>",
        "",
        1,
    );
    assert_ne!(damaged, TWO_COMBOS);
    let mut store = write_keymap(&dir, &damaged);

    let report = store.load().unwrap();
    assert_eq!(report.loaded, 1);
    assert_eq!(report.skipped, 1);
    assert!(!report.is_clean());
    assert_eq!(store.combos()[0].description, "swallow F3");
}

#[test]
fn test_truncated_document_fails_the_load() {
    let dir = TempDir::new().unwrap();
    let truncated = &TWO_COMBOS[..TWO_COMBOS.find("<userKeyCombo>\n        <in>\n            <mod></mod>").unwrap()];
    let mut store = write_keymap(&dir, truncated);

    match store.load() {
        Err(StoreError::Parse { source, .. }) => assert!(source.line > 1, "{}", source),
        other => panic!("expected a parse failure, got {:?}", other),
    }
    assert!(store.is_empty());
}

#[test]
fn test_zeroed_or_header_only_file_fails_the_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keymap.xml");
    let mut store = ComboStore::with_path(&path);
    store.save(vec![Combo::template()]).unwrap();

    for leftover in ["", "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"] {
        fs::write(&path, leftover).unwrap();
        match store.reload() {
            Err(StoreError::Parse { source, .. }) => {
                assert!(source.message.contains("premature end of document"), "{}", source)
            }
            other => panic!("expected a parse failure for {:?}, got {:?}", leftover, other),
        }
        assert!(store.is_empty());
    }
}

#[test]
fn test_bridge_edit_cycle() {
    let dir = TempDir::new().unwrap();
    let store = write_keymap(&dir, TWO_COMBOS).into_shared();
    let bridge = ComboBridge::new(store.clone(), NativeKeymap::Xkb);
    bridge.reload_combos().unwrap();

    // Drop the blocker and add a combo the way the editor does
    let mut records = bridge.load_combos();
    records.pop();
    let mut added: ComboRecord = bridge.empty_combo();
    added.input = bridge.parse_tokens("alt+v").unwrap();
    added.outputs = vec![bridge.parse_tokens("ctrl+v").unwrap()];
    added.description = "paste".to_string();
    records.push(added);
    bridge.save_combos(records).unwrap();

    let mut reopened = ComboStore::with_path(dir.path().join("keymap.xml"));
    assert_eq!(reopened.load().unwrap().loaded, 2);
    assert_eq!(reopened.combos()[1].description, "paste");
    assert!(reopened.combos().iter().all(|c| !c.is_blocker()));

    let engine = ComboEngine::new(
        store,
        EngineSettings {
            combos_enabled: true,
            absolute_mouse_mode: true,
            native_keymap: NativeKeymap::Xkb,
        },
    );
    let mut sink = Vec::new();
    let press = KeyEvent::press(Scancode::V, Modifiers::RALT);
    assert_eq!(
        engine.handle_key_event(&press, &mut sink),
        Disposition::Replaced { emitted: 6 }
    );
    let f3 = KeyEvent::press(Scancode::F3, Modifiers::empty());
    assert_eq!(engine.handle_key_event(&f3, &mut sink), Disposition::Forward);
}
