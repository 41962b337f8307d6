//! Per-platform accounting reads and spell encoding.
//!
//! One [`PlatformAdapter`] per wrapper-token type. A [`CollateralId`] is typed
//! by its wrapper, and each adapter's [`CollateralDecoder`] accepts only ids
//! of its own wrapper type. Ids are minted solely by [`BoundPosition`], whose
//! adapter variant is selected from the pool's [`WrapperKind`].

pub mod boosted;
pub mod encoding;
pub mod lp_pair;
pub mod masterchef;
pub mod minichef;

use alloy::primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::errors::EngineError;
use crate::execution::chain_client::ChainClient;
use crate::types::{PlatformAddresses, Position, PositionInfo, WrapperKind};
use wrapper::WrapperType;

pub use boosted::BoostedMasterChefJoeAdapter;
pub use encoding::{AddLiquidity, ClosePosition, RemoveLiquidity, RepayRequest};
pub use lp_pair::{LpPair, LpState};
pub use masterchef::MasterChefJoeAdapter;
pub use minichef::MiniChefPngAdapter;

// ---------------------------------------------------------------------------
// Collateral ids
// ---------------------------------------------------------------------------

/// Zero-sized markers, one per [`WrapperKind`].
pub mod wrapper {
    use crate::types::WrapperKind;

    mod sealed {
        pub trait Sealed {}
    }

    pub trait WrapperType: sealed::Sealed + Send + Sync + 'static {
        const KIND: WrapperKind;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MasterChefJoe;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BoostedMasterChefJoe;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MiniChefPng;

    impl sealed::Sealed for MasterChefJoe {}
    impl sealed::Sealed for BoostedMasterChefJoe {}
    impl sealed::Sealed for MiniChefPng {}

    impl WrapperType for MasterChefJoe {
        const KIND: WrapperKind = WrapperKind::MasterChefJoe;
    }

    impl WrapperType for BoostedMasterChefJoe {
        const KIND: WrapperKind = WrapperKind::BoostedMasterChefJoe;
    }

    impl WrapperType for MiniChefPng {
        const KIND: WrapperKind = WrapperKind::MiniChefPng;
    }
}

/// A raw collateral id typed by the wrapper that minted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollateralId<W: WrapperType> {
    raw: U256,
    wrapper: PhantomData<W>,
}

impl<W: WrapperType> CollateralId<W> {
    pub(crate) fn new(raw: U256) -> Self {
        Self {
            raw,
            wrapper: PhantomData,
        }
    }

    pub fn raw(&self) -> U256 {
        self.raw
    }

    pub fn kind(&self) -> WrapperKind {
        W::KIND
    }
}

/// Pool index and entry checkpoint packed in a collateral id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedCollateral {
    pub pool_index: U256,
    pub entry_reward_per_share: U256,
}

// ---------------------------------------------------------------------------
// Pool accounting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimplePoolAccounting {
    pub lp_token: Address,
    pub acc_reward_per_share: U256,
    pub alloc_point: U256,
    pub last_reward_timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoostedPoolAccounting {
    pub lp_token: Address,
    pub acc_reward_per_share: U256,
    pub alloc_point: U256,
    pub last_reward_timestamp: u64,
    /// Wrapper-level accumulated reward per share.
    pub wrapper_reward_per_share: U256,
    /// LP amount the wrapper has staked in the chef.
    pub wrapper_lp_amount: U256,
    /// The chef's reward debt for the wrapper.
    pub wrapper_reward_debt: U256,
}

/// Staking-pool snapshot; the shape follows the reward model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolAccounting {
    Simple(SimplePoolAccounting),
    Boosted(BoostedPoolAccounting),
}

impl PoolAccounting {
    pub fn lp_token(&self) -> Address {
        match self {
            Self::Simple(s) => s.lp_token,
            Self::Boosted(b) => b.lp_token,
        }
    }

    pub fn acc_reward_per_share(&self) -> U256 {
        match self {
            Self::Simple(s) => s.acc_reward_per_share,
            Self::Boosted(b) => b.acc_reward_per_share,
        }
    }
}

// ---------------------------------------------------------------------------
// PlatformAdapter
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn kind(&self) -> WrapperKind;

    /// Contracts this adapter reads from and encodes against.
    fn addresses(&self) -> PlatformAddresses;

    /// Spell used when the pool carries no override.
    fn default_spell(&self) -> Address {
        self.addresses().spell
    }

    async fn pool_accounting(&self, pool_index: U256) -> Result<PoolAccounting, EngineError>;

    fn encode_add_liquidity(&self, params: &AddLiquidity) -> Bytes;

    fn encode_remove_liquidity(&self, params: &RemoveLiquidity) -> Bytes;

    /// Remove everything; nonzero debts are repaid via the repay-max sentinel.
    fn encode_close_position(&self, params: &ClosePosition) -> Bytes {
        self.encode_remove_liquidity(&params.as_remove())
    }

    fn encode_claim_rewards(&self) -> Bytes;

    /// Name of the spell function a payload invokes, if it is one of ours.
    fn action_name(&self, payload: &[u8]) -> Option<&'static str>;

    fn lp_contract(&self, address: Address) -> LpPair;
}

/// Collateral-id decoding, typed by the adapter's wrapper.
#[async_trait]
pub trait CollateralDecoder: PlatformAdapter {
    type Wrapper: WrapperType;

    /// Decode through the platform's wrapper contract.
    async fn decode_collateral_id(
        &self,
        id: CollateralId<Self::Wrapper>,
    ) -> Result<DecodedCollateral, EngineError>;
}

// ---------------------------------------------------------------------------
// BoundPosition
// ---------------------------------------------------------------------------

/// Concrete adapter of a bound position. The variant fixes the collateral
/// id type its decoder accepts.
#[derive(Clone)]
enum BoundAdapter {
    MasterChefJoe(Arc<MasterChefJoeAdapter>),
    BoostedMasterChefJoe(Arc<BoostedMasterChefJoeAdapter>),
    MiniChefPng(Arc<MiniChefPngAdapter>),
}

impl BoundAdapter {
    fn new(kind: WrapperKind, addresses: PlatformAddresses, client: Arc<dyn ChainClient>) -> Self {
        match kind {
            WrapperKind::MasterChefJoe => {
                Self::MasterChefJoe(Arc::new(MasterChefJoeAdapter::new(client, addresses)))
            }
            WrapperKind::BoostedMasterChefJoe => Self::BoostedMasterChefJoe(Arc::new(
                BoostedMasterChefJoeAdapter::new(client, addresses),
            )),
            WrapperKind::MiniChefPng => {
                Self::MiniChefPng(Arc::new(MiniChefPngAdapter::new(client, addresses)))
            }
        }
    }

    fn as_dyn(&self) -> &dyn PlatformAdapter {
        match self {
            Self::MasterChefJoe(a) => a.as_ref(),
            Self::BoostedMasterChefJoe(a) => a.as_ref(),
            Self::MiniChefPng(a) => a.as_ref(),
        }
    }
}

/// A position paired with the adapter of its pool's wrapper type.
#[derive(Clone)]
pub struct BoundPosition {
    position: Position,
    adapter: BoundAdapter,
}

impl BoundPosition {
    pub fn bind(position: Position, client: Arc<dyn ChainClient>) -> Self {
        let adapter = BoundAdapter::new(position.pool.wrapper, position.pool.contracts, client);
        Self { position, adapter }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn adapter(&self) -> &dyn PlatformAdapter {
        self.adapter.as_dyn()
    }

    /// Decode the on-chain collateral id with this pool's wrapper.
    pub async fn decode_collateral(
        &self,
        info: &PositionInfo,
    ) -> Result<DecodedCollateral, EngineError> {
        let raw = info.collateral_id;
        match &self.adapter {
            BoundAdapter::MasterChefJoe(a) => decode_with(a.as_ref(), raw).await,
            BoundAdapter::BoostedMasterChefJoe(a) => decode_with(a.as_ref(), raw).await,
            BoundAdapter::MiniChefPng(a) => decode_with(a.as_ref(), raw).await,
        }
    }

    /// Spell address for the bank envelope.
    pub fn action_address(&self) -> Address {
        self.position
            .pool
            .spell_override
            .unwrap_or_else(|| self.adapter().default_spell())
    }
}

async fn decode_with<A: CollateralDecoder>(
    adapter: &A,
    raw: U256,
) -> Result<DecodedCollateral, EngineError> {
    adapter.decode_collateral_id(CollateralId::new(raw)).await
}

impl std::fmt::Debug for BoundPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundPosition")
            .field("id", &self.position.id)
            .field("pool", &self.position.pool.key)
            .field("adapter", &self.adapter().kind())
            .finish()
    }
}
