//! Minimal Solidity ABI codec.
//!
//! Covers what the governance plugins use: static words (`uint`, `bool`,
//! `address`), `bytes`, dynamic arrays and tuples. Every read is bounds
//! checked; malformed data is an [`ChainError::Abi`], never a panic.

use agora_types::{Address, U256};
use sha3::{Digest, Keccak256};

use crate::error::ChainError;

pub const WORD: usize = 32;

/// keccak256 of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// 4-byte function selector of a canonical signature, e.g. `getProposal(uint256)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Event topic 0 of a canonical event signature.
pub fn event_topic(signature: &str) -> [u8; 32] {
    keccak256(signature.as_bytes())
}

pub fn u256_word(value: U256) -> [u8; 32] {
    value.to_be_bytes()
}

// ── Encoding ────────────────────────────────────────────────────────────

/// A value to encode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Uint(U256),
    Bool(bool),
    Address(Address),
    Bytes(Vec<u8>),
    Array(Vec<Token>),
    Tuple(Vec<Token>),
}

impl Token {
    pub fn uint(value: impl Into<U256>) -> Self {
        Self::Uint(value.into())
    }

    fn is_dynamic(&self) -> bool {
        match self {
            Self::Bytes(_) | Self::Array(_) => true,
            Self::Tuple(items) => items.iter().any(Token::is_dynamic),
            _ => false,
        }
    }

    fn head_len(&self) -> usize {
        match self {
            Self::Tuple(items) if !self.is_dynamic() => items.iter().map(Token::head_len).sum(),
            _ => WORD,
        }
    }
}

/// Encode a sequence of tokens with the standard head/tail layout.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_size: usize = tokens.iter().map(Token::head_len).sum();
    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for token in tokens {
        if token.is_dynamic() {
            head.extend_from_slice(&u256_word(U256::from((head_size + tail.len()) as u64)));
            tail.extend(encode_inner(token));
        } else {
            head.extend(encode_inner(token));
        }
    }

    head.extend(tail);
    head
}

fn encode_inner(token: &Token) -> Vec<u8> {
    match token {
        Token::Uint(v) => u256_word(*v).to_vec(),
        Token::Bool(b) => u256_word(if *b { U256::ONE } else { U256::ZERO }).to_vec(),
        Token::Address(a) => a.to_word().to_vec(),
        Token::Bytes(bytes) => {
            let mut out = u256_word(U256::from(bytes.len() as u64)).to_vec();
            out.extend_from_slice(bytes);
            let padding = (WORD - bytes.len() % WORD) % WORD;
            out.extend(std::iter::repeat(0u8).take(padding));
            out
        }
        Token::Array(items) => {
            let mut out = u256_word(U256::from(items.len() as u64)).to_vec();
            out.extend(encode(items));
            out
        }
        Token::Tuple(items) => encode(items),
    }
}

/// Calldata: selector followed by the encoded arguments.
pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut out = selector(signature).to_vec();
    out.extend(encode(args));
    out
}

// ── Decoding ────────────────────────────────────────────────────────────

/// Reads words relative to the start of an encoded tuple.
#[derive(Clone, Copy, Debug)]
pub struct Decoder<'a> {
    data: &'a [u8],
    base: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, base: 0 }
    }

    pub fn word(&self, index: usize) -> Result<&'a [u8; 32], ChainError> {
        let start = index
            .checked_mul(WORD)
            .and_then(|off| off.checked_add(self.base))
            .filter(|start| start.checked_add(WORD).is_some())
            .ok_or_else(|| ChainError::Abi("word index overflow".into()))?;
        self.data
            .get(start..start + WORD)
            .and_then(|w| w.try_into().ok())
            .ok_or_else(|| {
                ChainError::Abi(format!(
                    "word {index} out of bounds ({} bytes)",
                    self.data.len()
                ))
            })
    }

    pub fn uint(&self, index: usize) -> Result<U256, ChainError> {
        Ok(U256::from_be_bytes(*self.word(index)?))
    }

    /// A `uintN` with `N <= 64`; higher bits must be clear.
    pub fn u64(&self, index: usize) -> Result<u64, ChainError> {
        let value = self.uint(index)?;
        if value > U256::from(u64::MAX) {
            return Err(ChainError::Abi(format!("word {index} does not fit in 64 bits")));
        }
        Ok(value.as_u64())
    }

    pub fn u32(&self, index: usize) -> Result<u32, ChainError> {
        let value = self.u64(index)?;
        u32::try_from(value)
            .map_err(|_| ChainError::Abi(format!("word {index} does not fit in 32 bits")))
    }

    pub fn u8(&self, index: usize) -> Result<u8, ChainError> {
        let value = self.u64(index)?;
        u8::try_from(value).map_err(|_| ChainError::Abi(format!("word {index} does not fit in 8 bits")))
    }

    pub fn bool(&self, index: usize) -> Result<bool, ChainError> {
        match self.u64(index)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ChainError::Abi(format!("invalid bool {other} at word {index}"))),
        }
    }

    pub fn address(&self, index: usize) -> Result<Address, ChainError> {
        let word = self.word(index)?;
        if word[..12].iter().any(|b| *b != 0) {
            return Err(ChainError::Abi(format!("dirty address padding at word {index}")));
        }
        Ok(Address::from_word(word))
    }

    /// Follow the offset stored at head word `index` to a dynamic value.
    pub fn tail(&self, index: usize) -> Result<Decoder<'a>, ChainError> {
        let offset = self.u64(index)? as usize;
        let base = self
            .base
            .checked_add(offset)
            .filter(|b| *b <= self.data.len())
            .ok_or_else(|| ChainError::Abi(format!("offset {offset} out of bounds")))?;
        Ok(Decoder { data: self.data, base })
    }

    /// Decode `bytes` whose offset is at head word `index`.
    pub fn bytes(&self, index: usize) -> Result<Vec<u8>, ChainError> {
        let tail = self.tail(index)?;
        let len = tail.u64(0)? as usize;
        let start = tail.base + WORD;
        self.data
            .get(start..start.saturating_add(len))
            .map(<[u8]>::to_vec)
            .ok_or_else(|| ChainError::Abi(format!("bytes of length {len} out of bounds")))
    }

    /// Decode a `string` whose offset is at head word `index`.
    pub fn string(&self, index: usize) -> Result<String, ChainError> {
        String::from_utf8(self.bytes(index)?)
            .map_err(|_| ChainError::Abi(format!("string at word {index} is not UTF-8")))
    }

    /// Decode a dynamic array whose offset is at head word `index`.
    ///
    /// Elements are handed to `element` as decoders positioned at each
    /// element; for dynamic elements (`dynamic_elements`) the per-element
    /// offsets are followed first.
    pub fn array<T>(
        &self,
        index: usize,
        dynamic_elements: bool,
        element_words: usize,
        mut element: impl FnMut(Decoder<'a>) -> Result<T, ChainError>,
    ) -> Result<Vec<T>, ChainError> {
        let tail = self.tail(index)?;
        let len = tail.u64(0)? as usize;
        // Each element needs at least one word; reject lengths the data cannot hold.
        if len > self.data.len() / WORD {
            return Err(ChainError::Abi(format!("array length {len} exceeds data")));
        }
        let items = Decoder {
            data: self.data,
            base: tail.base + WORD,
        };

        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            let item = if dynamic_elements {
                items.tail(i)?
            } else {
                Decoder {
                    data: self.data,
                    base: items.base + i * element_words * WORD,
                }
            };
            out.push(element(item)?);
        }
        Ok(out)
    }
}
