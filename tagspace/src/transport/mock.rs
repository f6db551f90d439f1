// tagspace-rs/tagspace/src/transport/mock.rs

use std::cell::RefCell;
use std::rc::Rc;

use crate::address::trailer_block;
use crate::constants::{
    BLOCK_SIZE, BLOCKS_PER_SECTOR, CAPABILITY_MAGIC, CAPABILITY_PAGE, FACTORY_TRAILER,
    FACTORY_ULTRALIGHT_CONFIG, FIRST_USER_PAGE, MAX_SECTOR, PAGE_SIZE, SAK_CLASSIC_1K,
    SAK_ULTRALIGHT, TRAILER_BLOCK,
};
use crate::protection::access_bits::{AccessConditions, data_rights, trailer_rights};
use crate::protection::ultralight::ProtectionWindow;
use crate::transport::traits::Transport;
use crate::types::{AuthKey, CapacityClass, KeySlot, Uid};
use crate::{Error, Result};

/// One call received by the mock, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    DetectAndSelect,
    ReadUnit(u16),
    WriteUnit(u16, Vec<u8>),
    Authenticate { slot: KeySlot, block: u16 },
    PasswordChallenge([u8; 4]),
    EndAuthSession,
    Halt,
}

#[derive(Debug)]
enum Memory {
    Classic {
        blocks: Vec<[u8; BLOCK_SIZE]>,
        /// Sector and slot of the open Crypto1 session
        auth: Option<(u16, KeySlot)>,
    },
    Ntag {
        pages: Vec<[u8; PAGE_SIZE]>,
        config_page: usize,
        /// PROT/AUTH0 as latched at the last selection
        window: ProtectionWindow,
        authenticated: bool,
    },
}

#[derive(Debug)]
struct TagState {
    memory: Memory,
    sak: u8,
    uid: Vec<u8>,
    present: bool,
    selected: bool,
    poll_misses: usize,
    failing_units: Vec<u16>,
    calls: Vec<MockCall>,
}

/// Simulated MIFARE Classic 1K or NTAG21x tag for unit and integration
/// tests.
///
/// Unlike a scripted mock it keeps real tag memory and enforces what the
/// silicon enforces: keys and access conditions per sector, KeyB being
/// unusable while readable, password windows, and the loss of all
/// authentication on halt. Two simplifications: authentication is refused
/// outright when the key holds no right at all on the target block, and a
/// trailer carrying invalid access bits is rejected instead of bricking the
/// sector.
///
/// Clones share the same tag, so a test can keep a handle for inspection
/// after boxing the transport into a session.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Rc<RefCell<TagState>>,
}

impl MockTransport {
    fn with_memory(memory: Memory, sak: u8, uid: Vec<u8>) -> Self {
        Self {
            state: Rc::new(RefCell::new(TagState {
                memory,
                sak,
                uid,
                present: true,
                selected: false,
                poll_misses: 0,
                failing_units: Vec::new(),
                calls: Vec::new(),
            })),
        }
    }

    /// Factory-fresh Classic 1K: zeroed data, transport trailers everywhere.
    pub fn classic_1k() -> Self {
        let uid = vec![0xDE, 0xAD, 0xBE, 0xEF];
        let mut blocks = vec![[0u8; BLOCK_SIZE]; 64];
        blocks[0][..4].copy_from_slice(&uid);
        blocks[0][4] = uid.iter().fold(0, |acc, b| acc ^ b);
        blocks[0][5] = SAK_CLASSIC_1K;
        for sector in 0..=MAX_SECTOR {
            blocks[trailer_block(sector) as usize] = FACTORY_TRAILER;
        }
        Self::with_memory(
            Memory::Classic { blocks, auth: None },
            SAK_CLASSIC_1K,
            uid,
        )
    }

    /// Factory-fresh NTAG of the given class. `Unknown` builds an NTAG213
    /// memory whose capability container carries an unrecognised size byte.
    pub fn ntag(class: CapacityClass) -> Self {
        let uid = vec![0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66];
        let layout = match class {
            CapacityClass::Unknown => CapacityClass::Small,
            known => known,
        };
        let mut pages = vec![[0u8; PAGE_SIZE]; layout.total_pages() as usize];
        pages[0] = [uid[0], uid[1], uid[2], 0x88 ^ uid[0] ^ uid[1] ^ uid[2]];
        pages[1] = [uid[3], uid[4], uid[5], uid[6]];
        pages[2] = [uid[3] ^ uid[4] ^ uid[5] ^ uid[6], 0x48, 0x00, 0x00];
        pages[CAPABILITY_PAGE as usize] = [CAPABILITY_MAGIC, 0x10, class.capability(), 0x00];
        let config_page = layout.config_page() as usize;
        for (i, chunk) in FACTORY_ULTRALIGHT_CONFIG.chunks_exact(PAGE_SIZE).enumerate() {
            pages[config_page + i].copy_from_slice(chunk);
        }
        // shipped password
        pages[config_page + 2] = [0xFF; PAGE_SIZE];
        Self::with_memory(
            Memory::Ntag {
                pages,
                config_page,
                window: ProtectionWindow::Open,
                authenticated: false,
            },
            SAK_ULTRALIGHT,
            uid,
        )
    }

    /// Override the SAK reported by the tag.
    pub fn with_signature(self, sak: u8) -> Self {
        self.state.borrow_mut().sak = sak;
        self
    }

    /// Take the tag out of the field.
    pub fn remove_card(&self) {
        let mut s = self.state.borrow_mut();
        s.present = false;
        s.selected = false;
    }

    pub fn insert_card(&self) {
        self.state.borrow_mut().present = true;
    }

    /// Make the next `n` presence checks miss.
    pub fn set_poll_misses(&self, n: usize) {
        self.state.borrow_mut().poll_misses = n;
    }

    /// Reject every read and write of `unit`.
    pub fn fail_unit(&self, unit: u16) {
        self.state.borrow_mut().failing_units.push(unit);
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn count_calls(&self, pred: impl Fn(&MockCall) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| pred(c)).count()
    }

    /// Raw Classic block, bypassing access control.
    pub fn block(&self, index: u16) -> Option<[u8; BLOCK_SIZE]> {
        match &self.state.borrow().memory {
            Memory::Classic { blocks, .. } => blocks.get(index as usize).copied(),
            Memory::Ntag { .. } => None,
        }
    }

    /// Overwrite a raw Classic block. Ignored on an NTAG.
    pub fn set_block(&self, index: u16, data: [u8; BLOCK_SIZE]) {
        if let Memory::Classic { blocks, .. } = &mut self.state.borrow_mut().memory {
            if let Some(b) = blocks.get_mut(index as usize) {
                *b = data;
            }
        }
    }

    /// Raw NTAG page, bypassing password protection.
    pub fn page(&self, index: u16) -> Option<[u8; PAGE_SIZE]> {
        match &self.state.borrow().memory {
            Memory::Ntag { pages, .. } => pages.get(index as usize).copied(),
            Memory::Classic { .. } => None,
        }
    }

    /// Overwrite a raw NTAG page. Ignored on a Classic.
    pub fn set_page(&self, index: u16, data: [u8; PAGE_SIZE]) {
        if let Memory::Ntag { pages, .. } = &mut self.state.borrow_mut().memory {
            if let Some(p) = pages.get_mut(index as usize) {
                *p = data;
            }
        }
    }

    /// Whether the NTAG currently holds a successful PWD_AUTH.
    pub fn is_password_authenticated(&self) -> bool {
        matches!(
            self.state.borrow().memory,
            Memory::Ntag {
                authenticated: true,
                ..
            }
        )
    }
}

impl TagState {
    fn check_unit(&self, index: u16) -> Result<()> {
        if !self.selected {
            return Err(Error::transport(index, "no tag selected"));
        }
        if self.failing_units.contains(&index) {
            return Err(Error::transport(index, "injected failure"));
        }
        Ok(())
    }

    fn select(&mut self) {
        self.selected = true;
        if let Memory::Ntag {
            pages,
            config_page,
            window,
            ..
        } = &mut self.memory
        {
            *window = ntag_window(pages, *config_page);
        }
    }

    fn drop_auth(&mut self) {
        match &mut self.memory {
            Memory::Classic { auth, .. } => *auth = None,
            Memory::Ntag { authenticated, .. } => *authenticated = false,
        }
    }
}

fn sector_access(blocks: &[[u8; BLOCK_SIZE]], sector: u16) -> Option<AccessConditions> {
    let t = blocks.get(trailer_block(sector) as usize)?;
    AccessConditions::decode([t[6], t[7], t[8]]).ok()
}

fn classic_authenticate(
    blocks: &[[u8; BLOCK_SIZE]],
    slot: KeySlot,
    key: &AuthKey,
    block: u16,
) -> Result<u16> {
    let refused = Error::AuthenticationFailed { unit: block };
    let sector = block / BLOCKS_PER_SECTOR;
    let (Some(trailer), Some(ac)) = (
        blocks.get(trailer_block(sector) as usize),
        sector_access(blocks, sector),
    ) else {
        return Err(refused);
    };
    let stored = match slot {
        KeySlot::A => &trailer[..6],
        KeySlot::B => &trailer[10..],
    };
    if stored != &key.as_bytes()[..] {
        return Err(refused);
    }
    let t = trailer_rights(ac.trailer);
    if slot == KeySlot::B && t.key_b_is_data() {
        return Err(refused);
    }
    let offset = block % BLOCKS_PER_SECTOR;
    let holds_rights = if offset == TRAILER_BLOCK {
        t.key_a_write.allows(slot)
            || t.access_read.allows(slot)
            || t.access_write.allows(slot)
            || t.key_b_write.allows(slot)
    } else {
        let d = data_rights(ac.code_for(offset));
        d.read.allows(slot) || d.write.allows(slot)
    };
    if !holds_rights {
        return Err(refused);
    }
    Ok(sector)
}

fn classic_read(
    blocks: &[[u8; BLOCK_SIZE]],
    auth: Option<(u16, KeySlot)>,
    index: u16,
) -> Result<[u8; 16]> {
    let sector = index / BLOCKS_PER_SECTOR;
    let data = blocks
        .get(index as usize)
        .ok_or_else(|| Error::transport(index, "no such block"))?;
    let slot = match auth {
        Some((s, slot)) if s == sector => slot,
        _ => return Err(Error::transport(index, "not authenticated")),
    };
    let ac = sector_access(blocks, sector)
        .ok_or_else(|| Error::transport(index, "sector locked"))?;
    let offset = index % BLOCKS_PER_SECTOR;
    if offset == TRAILER_BLOCK {
        let mut out = *data;
        out[..6].fill(0);
        if !trailer_rights(ac.trailer).key_b_read.allows(slot) {
            out[10..].fill(0);
        }
        return Ok(out);
    }
    if !data_rights(ac.code_for(offset)).read.allows(slot) {
        return Err(Error::transport(index, "read not permitted"));
    }
    Ok(*data)
}

fn classic_write(
    blocks: &mut [[u8; BLOCK_SIZE]],
    auth: Option<(u16, KeySlot)>,
    index: u16,
    data: &[u8],
) -> Result<()> {
    if data.len() != BLOCK_SIZE {
        return Err(Error::transport(index, "block write needs 16 bytes"));
    }
    if index == 0 || index as usize >= blocks.len() {
        return Err(Error::transport(index, "block not writable"));
    }
    let sector = index / BLOCKS_PER_SECTOR;
    let slot = match auth {
        Some((s, slot)) if s == sector => slot,
        _ => return Err(Error::transport(index, "not authenticated")),
    };
    let ac = sector_access(blocks, sector)
        .ok_or_else(|| Error::transport(index, "sector locked"))?;
    let offset = index % BLOCKS_PER_SECTOR;
    let current = blocks[index as usize];
    if offset == TRAILER_BLOCK {
        if AccessConditions::decode([data[6], data[7], data[8]]).is_err() {
            return Err(Error::transport(index, "refusing invalid access bits"));
        }
        let t = trailer_rights(ac.trailer);
        let denied = (data[..6] != current[..6] && !t.key_a_write.allows(slot))
            || (data[6..10] != current[6..10] && !t.access_write.allows(slot))
            || (data[10..] != current[10..] && !t.key_b_write.allows(slot));
        if denied {
            return Err(Error::transport(index, "trailer write not permitted"));
        }
    } else if !data_rights(ac.code_for(offset)).write.allows(slot) {
        return Err(Error::transport(index, "write not permitted"));
    }
    blocks[index as usize].copy_from_slice(data);
    Ok(())
}

fn ntag_window(pages: &[[u8; PAGE_SIZE]], config_page: usize) -> ProtectionWindow {
    match (pages.get(config_page), pages.get(config_page + 1)) {
        (Some(cfg0), Some(cfg1)) => ProtectionWindow::from_fields(cfg1[0], cfg0[3]),
        _ => ProtectionWindow::Open,
    }
}

impl Transport for MockTransport {
    fn detect_and_select(&mut self) -> Result<bool> {
        let mut s = self.state.borrow_mut();
        s.calls.push(MockCall::DetectAndSelect);
        if !s.present {
            return Ok(false);
        }
        if s.poll_misses > 0 {
            s.poll_misses -= 1;
            return Ok(false);
        }
        s.select();
        Ok(true)
    }

    fn uid(&self) -> Option<Uid> {
        let s = self.state.borrow();
        if !s.selected {
            return None;
        }
        Uid::try_from(&s.uid[..]).ok()
    }

    fn family_signature(&self) -> Result<u8> {
        let s = self.state.borrow();
        if !s.selected {
            return Err(Error::transport(0u16, "no tag selected"));
        }
        Ok(s.sak)
    }

    fn read_unit(&mut self, index: u16) -> Result<[u8; 16]> {
        let mut s = self.state.borrow_mut();
        s.calls.push(MockCall::ReadUnit(index));
        s.check_unit(index)?;
        match &s.memory {
            Memory::Classic { blocks, auth } => classic_read(blocks, *auth, index),
            Memory::Ntag {
                pages,
                config_page,
                window,
                authenticated,
            } => {
                if index as usize >= pages.len() {
                    return Err(Error::transport(index, "no such page"));
                }
                if window.guards_read(index) && !authenticated {
                    return Err(Error::transport(index, "password required"));
                }
                let mut out = [0u8; 16];
                for (i, dst) in out.chunks_exact_mut(PAGE_SIZE).enumerate() {
                    let p = (index as usize + i) % pages.len();
                    // PWD and PACK always read back as zeros
                    if p != config_page + 2 && p != config_page + 3 {
                        dst.copy_from_slice(&pages[p]);
                    }
                }
                Ok(out)
            }
        }
    }

    fn write_unit(&mut self, index: u16, data: &[u8]) -> Result<()> {
        let mut s = self.state.borrow_mut();
        s.calls.push(MockCall::WriteUnit(index, data.to_vec()));
        s.check_unit(index)?;
        match &mut s.memory {
            Memory::Classic { blocks, auth } => classic_write(blocks, *auth, index, data),
            Memory::Ntag {
                pages,
                window,
                authenticated,
                ..
            } => {
                if data.len() != PAGE_SIZE {
                    return Err(Error::transport(index, "page write needs 4 bytes"));
                }
                if index < FIRST_USER_PAGE as u16 || index as usize >= pages.len() {
                    return Err(Error::transport(index, "page not writable"));
                }
                if window.guards_write(index) && !*authenticated {
                    return Err(Error::transport(index, "password required"));
                }
                pages[index as usize].copy_from_slice(data);
                Ok(())
            }
        }
    }

    fn authenticate(&mut self, slot: KeySlot, key: &AuthKey, block: u16) -> Result<()> {
        let mut s = self.state.borrow_mut();
        s.calls.push(MockCall::Authenticate { slot, block });
        if !s.selected {
            return Err(Error::AuthenticationFailed { unit: block });
        }
        match &mut s.memory {
            Memory::Classic { blocks, auth } => {
                *auth = None;
                let sector = classic_authenticate(blocks, slot, key, block)?;
                *auth = Some((sector, slot));
                Ok(())
            }
            Memory::Ntag { .. } => Err(Error::UnsupportedOperation(
                "key authentication on an NTAG".into(),
            )),
        }
    }

    fn password_challenge(&mut self, password: [u8; 4]) -> Result<[u8; 2]> {
        let mut s = self.state.borrow_mut();
        s.calls.push(MockCall::PasswordChallenge(password));
        let selected = s.selected;
        match &mut s.memory {
            Memory::Ntag {
                pages,
                config_page,
                authenticated,
                ..
            } => {
                let unit = *config_page as u16 + 2;
                *authenticated = false;
                if !selected || pages[*config_page + 2] != password {
                    return Err(Error::AuthenticationFailed { unit });
                }
                *authenticated = true;
                let pack = pages[*config_page + 3];
                Ok([pack[0], pack[1]])
            }
            Memory::Classic { .. } => Err(Error::UnsupportedOperation(
                "password challenge on a Classic".into(),
            )),
        }
    }

    fn end_auth_session(&mut self) -> Result<()> {
        let mut s = self.state.borrow_mut();
        s.calls.push(MockCall::EndAuthSession);
        if let Memory::Classic { auth, .. } = &mut s.memory {
            *auth = None;
        }
        Ok(())
    }

    fn halt(&mut self) -> Result<()> {
        let mut s = self.state.borrow_mut();
        s.calls.push(MockCall::Halt);
        s.selected = false;
        s.drop_auth();
        Ok(())
    }
}
