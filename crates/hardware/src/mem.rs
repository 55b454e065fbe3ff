//! Word-indexed backing store with a latent request/response pipeline.
//!
//! This module models the memory interconnect of the simulated system:
//! 1. **Backing store:** `mem_size_words` zero-initialized 32-bit words.
//! 2. **Request ring:** `pipeline_depth + 1` slots rotated once per tick;
//!    at most one new request may be issued per cycle, and a request
//!    issued during cycle *t* is retrievable by its issuer during the
//!    following cycle, after memory has ticked.
//! 3. **Wide loads:** Every load transfers `access_width_words` contiguous
//!    words aligned to the access width; fetch exploits this to cache
//!    `2 × access_width_words` halfwords at a time.
//!
//! The extra ring slot keeps a served response alive for one rotation so
//! the issuer can still retrieve it while the ring moves on.

use crate::common::constants::{
    BYTES_PER_WORD, RESET_VECTOR_PC_ADDRESS, THUMB_INST_BYTES, word_index, words_to_bytes,
};
use crate::common::error::Fault;

/// Components that may issue memory requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Issuer {
    Fetch,
    Decode,
    Execute,
    Reset,
}

impl Issuer {
    /// Returns the display name of this issuer.
    pub fn name(self) -> &'static str {
        match self {
            Issuer::Fetch => "FETCH",
            Issuer::Decode => "DECODE",
            Issuer::Execute => "EXECUTE",
            Issuer::Reset => "RESET",
        }
    }
}

/// Kind of access held by an occupied request slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AccessKind {
    Load,
    Store,
}

/// One slot of the request/response ring.
#[derive(Clone, Debug)]
struct Request {
    /// Occupying issuer, or `None` for a free slot.
    issuer: Option<Issuer>,
    kind: AccessKind,
    token: u32,
    byte_addr: u32,
    /// Word to write for a store request.
    req_data: u32,
    /// Wide response line filled when a load is served.
    resp_data: Vec<u32>,
}

impl Request {
    fn new(access_width_words: u32) -> Self {
        Self {
            issuer: None,
            kind: AccessKind::Load,
            token: 0,
            byte_addr: 0,
            req_data: 0,
            resp_data: vec![0; access_width_words as usize],
        }
    }

    fn clear(&mut self) {
        self.issuer = None;
        self.kind = AccessKind::Load;
        self.token = 0;
        self.byte_addr = 0;
    }
}

/// Word-addressed memory with a fixed-latency request pipeline.
pub struct Memory {
    mem: Vec<u32>,
    mem_size_words: u32,
    access_width_words: u32,

    pipeline: Vec<Request>,
    next_req_index: u32,
    next_token: u32,
}

impl Memory {
    /// Creates a memory of `mem_size_words` words served through a ring of
    /// `pipeline_depth + 1` request slots.
    ///
    /// The size is rounded up to a multiple of `access_width_words` so a
    /// wide load never straddles the end of the store.
    pub fn new(mem_size_words: u32, access_width_words: u32, pipeline_depth: u32) -> Self {
        let mut size = mem_size_words;
        if mem_size_words % access_width_words > 0 {
            size += access_width_words - mem_size_words % access_width_words;
        }

        let ring_len = pipeline_depth + 1;
        let pipeline = (0..ring_len)
            .map(|_| Request::new(access_width_words))
            .collect();

        Self {
            mem: vec![0; size as usize],
            mem_size_words: size,
            access_width_words,
            pipeline,
            next_req_index: 0,
            next_token: 0,
        }
    }

    /// Returns the memory size in words (after rounding).
    pub fn mem_size_words(&self) -> u32 {
        self.mem_size_words
    }

    /// Returns the wide-access width in words.
    pub fn access_width_words(&self) -> u32 {
        self.access_width_words
    }

    /// Returns the word index of `byte_addr` within its wide access line.
    pub fn access_width_word_index(&self, byte_addr: u32) -> u32 {
        word_index(byte_addr & (BYTES_PER_WORD * self.access_width_words - 1))
    }

    /// Returns `byte_addr` rounded down to its wide access line base.
    pub fn access_width_base(&self, byte_addr: u32) -> u32 {
        byte_addr & !(BYTES_PER_WORD * self.access_width_words - 1)
    }

    /// Returns the halfword index of `byte_addr` within its wide access line.
    pub fn access_width_inst_offset(&self, byte_addr: u32) -> u32 {
        (byte_addr & (self.access_width_words * BYTES_PER_WORD - 1)) / THUMB_INST_BYTES
    }

    /// Reports whether a request can be issued this cycle.
    pub fn is_available(&self) -> bool {
        self.pipeline[self.next_req_index as usize].issuer.is_none()
    }

    /// Places a load request in the pipeline.
    ///
    /// Returns the token identifying the response, or `None` when a request
    /// was already issued this cycle.
    pub fn request_load(&mut self, issuer: Issuer, byte_addr: u32) -> Option<u32> {
        let slot = &mut self.pipeline[self.next_req_index as usize];
        if slot.issuer.is_some() {
            return None;
        }

        slot.issuer = Some(issuer);
        slot.kind = AccessKind::Load;
        slot.token = self.next_token;
        slot.byte_addr = byte_addr;

        let token = self.next_token;
        self.next_token = self.next_token.wrapping_add(1);
        Some(token)
    }

    /// Places a store request for one word in the pipeline.
    ///
    /// Returns the token identifying the response, or `None` when a request
    /// was already issued this cycle.
    pub fn request_store(&mut self, issuer: Issuer, byte_addr: u32, data: u32) -> Option<u32> {
        let slot = &mut self.pipeline[self.next_req_index as usize];
        if slot.issuer.is_some() {
            return None;
        }

        slot.issuer = Some(issuer);
        slot.kind = AccessKind::Store;
        slot.token = self.next_token;
        slot.byte_addr = byte_addr;
        slot.req_data = data;

        let token = self.next_token;
        self.next_token = self.next_token.wrapping_add(1);
        Some(token)
    }

    /// Index of the slot most recently served by `tick`.
    fn resp_index(&self) -> usize {
        let ring_len = self.pipeline.len() as u32;
        ((self.next_req_index + ring_len - 1) % ring_len) as usize
    }

    /// Retrieves the word a load response holds for `byte_addr`'s position
    /// within the wide line. Returns `None` when the response is not ready.
    pub fn retrieve_load(&self, token: u32) -> Option<u32> {
        let slot = &self.pipeline[self.resp_index()];
        if slot.token != token {
            return None;
        }
        let idx = self.access_width_word_index(slot.byte_addr) as usize;
        Some(slot.resp_data[idx])
    }

    /// Retrieves the full wide line of a load response. Returns `None` when
    /// the response is not ready.
    pub fn retrieve_wide_load(&self, token: u32) -> Option<&[u32]> {
        let slot = &self.pipeline[self.resp_index()];
        if slot.token != token {
            return None;
        }
        Some(&slot.resp_data)
    }

    /// Confirms completion of a store request. Returns `false` when the
    /// response is not ready.
    pub fn retrieve_store(&self, token: u32) -> bool {
        self.pipeline[self.resp_index()].token == token
    }

    /// Side-band, latency-free word read used for store read-modify-write
    /// and for the reset sequence.
    pub fn load_word(&self, byte_addr: u32) -> Result<u32, Fault> {
        let idx = word_index(byte_addr);
        if idx >= self.mem_size_words {
            return Err(Fault::OutOfBounds {
                byte_addr,
                mem_size_words: self.mem_size_words,
            });
        }
        Ok(self.mem[idx as usize])
    }

    /// Copies a flat little-endian program image to byte address 0.
    ///
    /// Returns the entry PC taken from the reset vector and the image size
    /// in bytes. Images that do not fit in memory are rejected.
    pub fn load_image(&mut self, image: &[u8]) -> Result<(u32, u32), Fault> {
        if image.len() as u64 >= u64::from(words_to_bytes(self.mem_size_words)) {
            return Err(Fault::ImageTooLarge {
                size_bytes: image.len() as u64,
                mem_size_words: self.mem_size_words,
            });
        }

        for (i, chunk) in image.chunks(BYTES_PER_WORD as usize).enumerate() {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            self.mem[i] = u32::from_le_bytes(word);
        }

        let pc = self.load_word(RESET_VECTOR_PC_ADDRESS)?;
        Ok((pc, image.len() as u32))
    }

    /// Rotates the ring and serves the request issued this cycle, if any.
    ///
    /// Loads fill the response line with `access_width_words` words starting
    /// from the wide access base; stores write their word into the backing
    /// store. Out-of-bounds requests are fatal.
    pub fn tick(&mut self) -> Result<(), Fault> {
        let ring_len = self.pipeline.len() as u32;
        let resp = self.next_req_index as usize;
        self.next_req_index = (self.next_req_index + 1) % ring_len;
        let cleared = self.next_req_index as usize;
        self.pipeline[cleared].clear();

        if self.pipeline[resp].issuer.is_none() {
            return Ok(());
        }

        let byte_addr = self.pipeline[resp].byte_addr;
        if word_index(byte_addr) >= self.mem_size_words {
            return Err(Fault::OutOfBounds {
                byte_addr,
                mem_size_words: self.mem_size_words,
            });
        }

        match self.pipeline[resp].kind {
            AccessKind::Load => {
                let base = word_index(self.access_width_base(byte_addr)) as usize;
                let width = self.access_width_words as usize;
                self.pipeline[resp]
                    .resp_data
                    .copy_from_slice(&self.mem[base..base + width]);
            }
            AccessKind::Store => {
                self.mem[word_index(byte_addr) as usize] = self.pipeline[resp].req_data;
            }
        }

        Ok(())
    }

    /// Dumps the request ring to stderr for debugging.
    pub fn dump_pipeline(&self) {
        let resp = self.resp_index();
        for (i, slot) in self.pipeline.iter().enumerate() {
            let issuer = slot.issuer.map_or("NONE", Issuer::name);
            let kind = match (slot.issuer.is_some(), slot.kind) {
                (false, _) => "NONE",
                (true, AccessKind::Load) => "LOAD",
                (true, AccessKind::Store) => "STORE",
            };
            let mut line = format!(
                "    i:{} token:{:#010X} type:{} byteAddr:{:#010X} issuer:{}",
                i, slot.token, kind, slot.byte_addr, issuer
            );
            if i as u32 == self.next_req_index {
                line.push_str(" <- nextReqIndex");
            }
            if i == resp {
                line.push_str(" <- nextRespIndex");
            }
            eprintln!("{}", line);
        }
    }
}
