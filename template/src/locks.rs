/*++

Licensed under the Apache-2.0 license.

File Name:

    locks.rs

Abstract:

    Slot lock configuration. Locked slots get their configuration bytes
    rewritten from the lockable/permanent tables, their write-lock nibble
    forced on, and their bit cleared in the SlotLocked mask.

--*/

use anyhow::Context;
use tflx_hexfmt::unprettify;
use tflx_profile::tables;
use tflx_profile::Profile;

use crate::dom::Element;

fn config_element_mut<'a>(
    root: &'a mut Element,
    tag: &str,
    slot: usize,
) -> anyhow::Result<&'a mut Element> {
    root.descendant_mut(tag, slot)
        .with_context(|| format!("template has no {tag} element for slot {slot}"))
}

fn set_config(root: &mut Element, tag: &str, slot: usize, value: &str) -> anyhow::Result<()> {
    config_element_mut(root, tag, slot)?.set_text(value);
    Ok(())
}

/// Force the write-lock nibble of a slot's configuration. The third nibble
/// of the two config bytes is the WriteConfig high nibble.
fn patch_write_lock(root: &mut Element, slot: usize) -> anyhow::Result<()> {
    let el = config_element_mut(root, "SlotConfiguration", slot)?;
    let mut nibbles: Vec<char> = unprettify(&el.text()).chars().collect();
    anyhow::ensure!(
        nibbles.len() == 4,
        "slot {slot} configuration is not two bytes"
    );
    nibbles[2] = '8';
    el.set_text(format!(
        "{}{} {}{}",
        nibbles[0], nibbles[1], nibbles[2], nibbles[3]
    ));
    Ok(())
}

/// Apply the per-slot lock flags from the profile and rewrite the
/// SlotLocked mask. A cleared mask bit means the slot ships locked.
pub fn apply_locks(root: &mut Element, profile: &Profile) -> anyhow::Result<()> {
    let mut mask: u16 = 0xFFFF;
    for slot in 0..tables::SLOT_COUNT {
        let Some(entry) = profile.slot(slot) else {
            continue;
        };
        if !entry.lock {
            continue;
        }
        mask &= !(1u16 << slot);
        if let Some(value) = tables::slot_config(slot, entry.lockable) {
            set_config(root, "SlotConfiguration", slot, value)?;
        }
        if let Some(value) = tables::key_config(slot, entry.lockable) {
            set_config(root, "KeyConfiguration", slot, value)?;
        }
        patch_write_lock(root, slot)?;
    }
    let text = format!("{:02X} {:02X}", mask >> 8, mask & 0xFF);
    root.descendant_mut("SlotLocked", 0)
        .context("template has no SlotLocked element")?
        .set_text(text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets;
    use tflx_profile::{SlotEntry, SlotSource};

    fn locked_entry(lockable: bool) -> SlotEntry {
        SlotEntry {
            source: SlotSource::Hex,
            data: Some("AB".repeat(32)),
            file: None,
            lockable,
            lock: true,
        }
    }

    #[test]
    fn test_lock_rewrites_config_and_mask() {
        let mut root = crate::dom::parse(assets::TFLXTLS_XML).unwrap();
        let mut profile = Profile::default();
        profile.slots.insert(5, locked_entry(true));
        apply_locks(&mut root, &profile).unwrap();
        // Table value for lockable slot 5 with the write-lock nibble forced.
        let slot_cfg = root.descendant("SlotConfiguration", 5).unwrap().text();
        assert_eq!(slot_cfg.chars().nth(3), Some('8'));
        assert_eq!(
            root.descendant("SlotLocked", 0).unwrap().text(),
            "FF DF"
        );
    }

    #[test]
    fn test_unlocked_slots_keep_mask() {
        let mut root = crate::dom::parse(assets::TFLXTLS_XML).unwrap();
        let mut profile = Profile::default();
        let mut entry = locked_entry(false);
        entry.lock = false;
        profile.slots.insert(8, entry);
        apply_locks(&mut root, &profile).unwrap();
        assert_eq!(root.descendant("SlotLocked", 0).unwrap().text(), "FF FF");
        assert_eq!(root.descendant("SlotConfiguration", 8).unwrap().text(), "0F 0F");
    }

    #[test]
    fn test_high_slot_lock_clears_high_byte() {
        let mut root = crate::dom::parse(assets::TFLXTLS_XML).unwrap();
        let mut profile = Profile::default();
        profile.slots.insert(15, locked_entry(true));
        apply_locks(&mut root, &profile).unwrap();
        assert_eq!(root.descendant("SlotLocked", 0).unwrap().text(), "7F FF");
    }
}
