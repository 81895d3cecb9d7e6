//! Input collection
//!
//! [`OrderForm`] holds the raw field values of one submission. It performs no
//! validation beyond what is needed to parse a field (an integer quantity); the
//! snapshot it yields is checked by the validator.
//!
//! The per-item sub-forms live in [`ItemSlots`], an ordered collection keyed
//! by a stable 1-based index that is regenerated whenever quantity changes.

use crate::config::Catalog;
use crate::core::error::RequestError;
use crate::core::order::{ItemSpec, OrderDraft, ProofAttachment};
use serde::Serialize;
use std::sync::Arc;

/// Per-item sub-forms, one per ordered item
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSlots {
    slots: Vec<ItemSpec>,
    default: ItemSpec,
}

impl ItemSlots {
    /// Create an empty collection; new slots start as `default`
    pub fn new(default: ItemSpec) -> Self {
        Self {
            slots: Vec::new(),
            default,
        }
    }

    /// Regenerate for a new quantity, preserving values of surviving slots
    pub fn resize(&mut self, quantity: usize) {
        self.slots.resize(quantity, self.default.clone());
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot at a 1-based index
    pub fn get(&self, index: usize) -> Option<&ItemSpec> {
        index.checked_sub(1).and_then(|i| self.slots.get(i))
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut ItemSpec> {
        index.checked_sub(1).and_then(|i| self.slots.get_mut(i))
    }

    /// Set the size of a slot; returns false when the slot does not exist
    pub fn set_size(&mut self, index: usize, size: impl Into<String>) -> bool {
        match self.get_mut(index) {
            Some(slot) => {
                slot.size = size.into();
                true
            }
            None => false,
        }
    }

    /// Set the sleeve style of a slot; returns false when the slot does not exist
    pub fn set_sleeve(&mut self, index: usize, sleeve: impl Into<String>) -> bool {
        match self.get_mut(index) {
            Some(slot) => {
                slot.sleeve = sleeve.into();
                true
            }
            None => false,
        }
    }

    /// Iterate slots with their 1-based index
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ItemSpec)> {
        self.slots.iter().enumerate().map(|(i, slot)| (i + 1, slot))
    }

    pub fn to_vec(&self) -> Vec<ItemSpec> {
        self.slots.clone()
    }
}

/// Current values of the order form
#[derive(Debug, Clone)]
pub struct OrderForm {
    catalog: Arc<Catalog>,
    pub coordinator: String,
    pub buyer_name: String,
    pub phone: String,
    pub address: String,
    quantity: u32,
    items: ItemSlots,
    pub payment_status: String,
    proof: Option<ProofAttachment>,
}

impl OrderForm {
    /// A fresh form: one item slot, first payment status selected
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let default_item = ItemSpec::new(catalog.default_size(), catalog.default_sleeve());
        let payment_status = catalog
            .payment_statuses
            .first()
            .cloned()
            .unwrap_or_default();
        let mut form = Self {
            catalog,
            coordinator: String::new(),
            buyer_name: String::new(),
            phone: String::new(),
            address: String::new(),
            quantity: 0,
            items: ItemSlots::new(default_item),
            payment_status,
            proof: None,
        };
        form.set_quantity(1);
        form
    }

    /// Build a form from submitted `(name, value)` pairs
    ///
    /// Quantity is applied first so that item fields land in existing slots;
    /// item fields beyond quantity are ignored.
    pub fn from_fields(
        catalog: Arc<Catalog>,
        fields: Vec<(String, String)>,
        proof: Option<ProofAttachment>,
    ) -> Result<Self, RequestError> {
        let mut form = Self::new(catalog);

        let (quantity, rest): (Vec<_>, Vec<_>) =
            fields.into_iter().partition(|(name, _)| name == "quantity");
        for (name, value) in quantity.into_iter().chain(rest) {
            form.apply_field(&name, value)?;
        }

        form.attach_proof(proof);
        Ok(form)
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Change quantity and regenerate the item slots
    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.items.resize(quantity as usize);
    }

    pub fn items(&self) -> &ItemSlots {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut ItemSlots {
        &mut self.items
    }

    /// Attach (or clear) the payment proof; empty uploads count as none
    pub fn attach_proof(&mut self, proof: Option<ProofAttachment>) {
        self.proof = proof.filter(|p| !p.is_empty());
    }

    /// Whether the proof upload field is shown for the current payment status
    pub fn proof_field_visible(&self) -> bool {
        self.catalog.requires_proof(&self.payment_status)
    }

    /// Apply one submitted field by name
    pub fn apply_field(&mut self, name: &str, value: String) -> Result<(), RequestError> {
        match name {
            "coordinator" => self.coordinator = value,
            "buyer_name" => self.buyer_name = value,
            "phone" => self.phone = value,
            "address" => self.address = value,
            "payment_status" => self.payment_status = value,
            "quantity" => {
                let quantity = parse_quantity(&value)?;
                if quantity > self.catalog.max_quantity {
                    return Err(RequestError::InvalidField {
                        field: "quantity".to_string(),
                        message: format!(
                            "at most {} items can be ordered at once",
                            self.catalog.max_quantity
                        ),
                    });
                }
                self.set_quantity(quantity);
            }
            _ => {
                if let Some(index) = item_index(name, "size_") {
                    if !self.items.set_size(index, value) {
                        tracing::debug!(field = name, "ignoring item field beyond quantity");
                    }
                } else if let Some(index) = item_index(name, "sleeve_") {
                    if !self.items.set_sleeve(index, value) {
                        tracing::debug!(field = name, "ignoring item field beyond quantity");
                    }
                } else {
                    tracing::debug!(field = name, "ignoring unknown form field");
                }
            }
        }
        Ok(())
    }

    /// Snapshot of the current values for validation
    pub fn snapshot(&self) -> OrderDraft {
        OrderDraft {
            coordinator: self.coordinator.clone(),
            buyer_name: self.buyer_name.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            quantity: self.quantity,
            items: self.items.to_vec(),
            payment_status: self.payment_status.clone(),
            proof: self.proof.clone(),
        }
    }

    /// Describe the form so a front end can render it
    pub fn descriptor(&self) -> FormDescriptor {
        let catalog = &self.catalog;
        let text = |name: &'static str, label: &'static str, kind: FieldKind| FieldDescriptor {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            required: true,
            choices: None,
            value: None,
        };

        let mut fields = vec![
            text("coordinator", "Coordinator", FieldKind::Text),
            text("buyer_name", "Full name", FieldKind::Text),
            text("phone", "Phone number", FieldKind::Text),
            text("address", "Full address", FieldKind::TextArea),
            FieldDescriptor {
                value: Some(self.quantity.to_string()),
                ..text("quantity", "Number of items", FieldKind::Number)
            },
        ];

        for (index, item) in self.items.iter() {
            fields.push(FieldDescriptor {
                name: format!("size_{}", index),
                label: format!("{} {} size", catalog.item_label, index),
                kind: FieldKind::Select,
                required: true,
                choices: Some(catalog.sizes.clone()),
                value: Some(item.size.clone()),
            });
            fields.push(FieldDescriptor {
                name: format!("sleeve_{}", index),
                label: format!("{} {} sleeve", catalog.item_label, index),
                kind: FieldKind::Select,
                required: true,
                choices: Some(catalog.sleeve_styles.clone()),
                value: Some(item.sleeve.clone()),
            });
        }

        fields.push(FieldDescriptor {
            choices: Some(catalog.payment_statuses.clone()),
            value: Some(self.payment_status.clone()),
            ..text("payment_status", "Payment status", FieldKind::Radio)
        });

        FormDescriptor {
            fields,
            proof: ProofFieldDescriptor {
                name: "payment_proof".to_string(),
                required_for_status: catalog.proof_required_status.clone(),
                visible: self.proof_field_visible(),
                accepted_extensions: catalog.proof_extensions.clone(),
                max_bytes: catalog.max_proof_bytes,
            },
            max_quantity: catalog.max_quantity,
        }
    }
}

fn parse_quantity(value: &str) -> Result<u32, RequestError> {
    let value = value.trim();
    // A blank quantity is left for the validator to report as missing
    if value.is_empty() {
        return Ok(0);
    }
    value
        .parse::<u32>()
        .map_err(|_| RequestError::InvalidField {
            field: "quantity".to_string(),
            message: format!("'{}' is not a whole number", value),
        })
}

/// Index of `size_3` style field names
fn item_index(name: &str, prefix: &str) -> Option<usize> {
    name.strip_prefix(prefix)?.parse().ok()
}

/// Kind of input control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    TextArea,
    Number,
    Select,
    Radio,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProofFieldDescriptor {
    pub name: String,
    pub required_for_status: String,
    pub visible: bool,
    pub accepted_extensions: Vec<String>,
    pub max_bytes: usize,
}

/// Renderable description of the form in its current state
#[derive(Debug, Clone, Serialize)]
pub struct FormDescriptor {
    pub fields: Vec<FieldDescriptor>,
    pub proof: ProofFieldDescriptor,
    pub max_quantity: u32,
}
