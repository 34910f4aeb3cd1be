//! ERC-20 / ERC-20Votes reads on the voting token.

use agora_types::{Address, BlockNumber, BlockTag, U256};

use crate::abi::{encode_call, Decoder, Token};
use crate::error::ChainError;
use crate::ContractReader;

pub const TOTAL_SUPPLY: &str = "totalSupply()";
pub const GET_PAST_TOTAL_SUPPLY: &str = "getPastTotalSupply(uint256)";
pub const GET_PAST_VOTES: &str = "getPastVotes(address,uint256)";
pub const DECIMALS: &str = "decimals()";
pub const SYMBOL: &str = "symbol()";

pub fn total_supply_call() -> Vec<u8> {
    encode_call(TOTAL_SUPPLY, &[])
}

pub fn past_total_supply_call(timepoint: BlockNumber) -> Vec<u8> {
    encode_call(GET_PAST_TOTAL_SUPPLY, &[Token::uint(timepoint.as_u64())])
}

pub fn past_votes_call(account: Address, timepoint: BlockNumber) -> Vec<u8> {
    encode_call(
        GET_PAST_VOTES,
        &[Token::Address(account), Token::uint(timepoint.as_u64())],
    )
}

pub fn decimals_call() -> Vec<u8> {
    encode_call(DECIMALS, &[])
}

pub fn symbol_call() -> Vec<u8> {
    encode_call(SYMBOL, &[])
}

/// Typed calls against the voting token.
pub struct TokenContract<'a, C> {
    reader: &'a C,
    address: Address,
}

impl<'a, C: ContractReader> TokenContract<'a, C> {
    pub fn new(reader: &'a C, address: Address) -> Self {
        Self { reader, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    async fn read(&self, calldata: Vec<u8>) -> Result<Vec<u8>, ChainError> {
        self.reader
            .call(self.address, calldata, BlockTag::Latest)
            .await
    }

    pub async fn total_supply(&self) -> Result<U256, ChainError> {
        Decoder::new(&self.read(total_supply_call()).await?).uint(0)
    }

    /// Supply checkpointed at `timepoint`, the denominator of veto thresholds.
    pub async fn past_total_supply(&self, timepoint: BlockNumber) -> Result<U256, ChainError> {
        Decoder::new(&self.read(past_total_supply_call(timepoint)).await?).uint(0)
    }

    /// Voting power `account` held at `timepoint`.
    pub async fn past_votes(&self, account: Address, timepoint: BlockNumber) -> Result<U256, ChainError> {
        Decoder::new(&self.read(past_votes_call(account, timepoint)).await?).uint(0)
    }

    pub async fn decimals(&self) -> Result<u8, ChainError> {
        Decoder::new(&self.read(decimals_call()).await?).u8(0)
    }

    pub async fn symbol(&self) -> Result<String, ChainError> {
        Decoder::new(&self.read(symbol_call()).await?).string(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{encode, selector};

    #[test]
    fn past_supply_call_layout() {
        let call = past_total_supply_call(BlockNumber::new(0x1234));
        assert_eq!(&call[..4], &selector(GET_PAST_TOTAL_SUPPLY));
        assert_eq!(&call[34..], &[0x12, 0x34]);
    }

    #[test]
    fn symbol_decodes_as_string() {
        let data = encode(&[Token::Bytes(b"AGORA".to_vec())]);
        assert_eq!(Decoder::new(&data).string(0).unwrap(), "AGORA");
    }
}
