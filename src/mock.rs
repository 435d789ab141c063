//! Recording stand-in for a target HAL, used by the unit tests

use ecan_core::{BusParameters, Dependencies, WireWords};
use fugit::HertzU32;
use std::collections::BTreeMap;
use std::vec::Vec;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Configure(BusParameters),
    Transmit(u8, WireWords),
    Receive(u8),
    Release(u8),
    ClearFlags(u16),
    EnableInterrupts(u16),
}

pub struct MockDependencies {
    pub events: Vec<Event>,
    pub flags: u16,
    pub enabled: u16,
    /// Message objects holding a received frame
    pub receive_objects: BTreeMap<u8, WireWords>,
    pub clock: HertzU32,
}

impl Default for MockDependencies {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            flags: 0,
            enabled: 0,
            receive_objects: BTreeMap::new(),
            clock: HertzU32::from_raw(40_000_000),
        }
    }
}

impl MockDependencies {
    pub fn transmissions(&self) -> impl Iterator<Item = (u8, WireWords)> + '_ {
        self.events.iter().filter_map(|e| match e {
            Event::Transmit(slot, words) => Some((*slot, *words)),
            _ => None,
        })
    }
}

impl Dependencies for MockDependencies {
    const MESSAGE_OBJECTS: u8 = 8;

    fn can_clock(&self) -> HertzU32 {
        self.clock
    }

    fn configure(&mut self, parameters: &BusParameters) {
        self.events.push(Event::Configure(*parameters));
    }

    fn hardware_transmit(&mut self, slot: u8, words: &WireWords) {
        self.events.push(Event::Transmit(slot, *words));
    }

    fn hardware_receive_words(&mut self, slot: u8) -> WireWords {
        self.events.push(Event::Receive(slot));
        self.receive_objects.get(&slot).copied().unwrap_or_default()
    }

    fn interrupt_flags(&self) -> u16 {
        self.flags
    }

    fn clear_interrupt_flags(&mut self, mask: u16) {
        self.events.push(Event::ClearFlags(mask));
        self.flags &= !mask;
    }

    fn set_interrupt_enable(&mut self, mask: u16) {
        self.events.push(Event::EnableInterrupts(mask));
        self.enabled = mask;
    }

    fn full_receive_slots(&self) -> u32 {
        self.receive_objects
            .keys()
            .fold(0, |set, slot| set | (1 << slot))
    }

    fn release_receive_slot(&mut self, slot: u8) {
        self.events.push(Event::Release(slot));
        self.receive_objects.remove(&slot);
    }
}
