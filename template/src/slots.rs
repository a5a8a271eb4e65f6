/*++

Licensed under the Apache-2.0 license.

File Name:

    slots.rs

Abstract:

    Data zone slot templating. User-supplied slot contents are formatted
    to the device's padded slot sizes and placed into the `Data` text of
    the matching `Slot` element.

--*/

use anyhow::{bail, ensure, Context};
use tflx_hexfmt::pretty_print;
use tflx_profile::tables::{self, SlotKind};

use crate::dom::Element;

/// Four reserved zero bytes framing each public key coordinate.
const ZERO_WORD: &str = "00 00 00 00\n";

/// Nesting indentation of a `Data` text node in the bundled template.
const DATA_INDENT: &str = "\n\t\t\t";

/// Format slot data for the `Data` text node of slot `slot`. The input is
/// normalized hex of exactly the declared slot size.
pub fn slot_data_text(slot: usize, data_hex: &str) -> anyhow::Result<String> {
    let (Some(size), Some(padded), Some(kind)) = (
        tables::slot_size(slot),
        tables::padded_size(slot),
        tables::slot_kind(slot),
    ) else {
        bail!("slot {slot} is not a data-zone slot");
    };
    ensure!(
        data_hex.len() == size * 2,
        "slot {slot} data is {} bytes, expected {size}",
        data_hex.len() / 2
    );
    let text = match kind {
        SlotKind::Secret => {
            let mut text = String::from("\n");
            text.push_str(&pretty_print(data_hex, 32));
            for _ in 0..(padded - size) {
                text.push_str("00 ");
            }
            text.push('\n');
            text
        }
        SlotKind::General => {
            let mut text = pretty_print(data_hex, 32);
            for _ in 0..(padded - size) {
                text.push_str("00 ");
            }
            text.push('\n');
            text
        }
        SlotKind::Public => {
            // 4 reserved bytes, X coordinate, 4 reserved bytes, Y coordinate.
            let mut text = String::from("\n");
            text.push_str(ZERO_WORD);
            text.push_str(&pretty_print(&data_hex[..64], 32));
            text.push_str(ZERO_WORD);
            text.push_str(&pretty_print(&data_hex[64..], 32));
            text
        }
        SlotKind::Private | SlotKind::Cert => {
            bail!("slot {slot} does not take templated data")
        }
    };
    Ok(text.replace('\n', DATA_INDENT))
}

fn slot_element_mut<'a>(root: &'a mut Element, slot: usize) -> anyhow::Result<&'a mut Element> {
    root.descendant_mut("Slot", slot)
        .with_context(|| format!("template has no Slot element for slot {slot}"))
}

/// Place formatted slot data into the document.
pub fn apply_slot_data(root: &mut Element, slot: usize, data_hex: &str) -> anyhow::Result<()> {
    let text = slot_data_text(slot, data_hex)?;
    let slot_el = slot_element_mut(root, slot)?;
    slot_el
        .descendant_mut("Data", 0)
        .with_context(|| format!("slot {slot} element has no Data child"))?
        .set_text(text);
    Ok(())
}

/// Mark an unused secret slot for on-device random generation.
pub fn randomize_slot(root: &mut Element, slot: usize) -> anyhow::Result<()> {
    slot_element_mut(root, slot)?.set_attr("Mode", "Random");
    Ok(())
}

/// Rewrite every `Mode="Random"` slot as an empty element carrying only
/// its `Index` and `Mode` attributes.
pub fn strip_random_slot_data(root: &mut Element) -> anyhow::Result<()> {
    for slot in 0..tables::SLOT_COUNT {
        let slot_el = slot_element_mut(root, slot)?;
        if slot_el.attr("Mode") == Some("Random") {
            slot_el.attrs = vec![
                ("Index".to_string(), slot.to_string()),
                ("Mode".to_string(), "Random".to_string()),
            ];
            slot_el.children.clear();
        }
    }
    Ok(())
}
