//! Compile-time ABI definitions for on-chain contracts via Alloy `sol!`.
//!
//! No `#[sol(rpc)]` instances: every read goes through the injected
//! [`ChainClient`](super::chain_client::ChainClient), so only the call
//! encoders and return decoders are generated.

#![allow(clippy::too_many_arguments)]

use alloy::sol;

// ---------------------------------------------------------------------------
// HomoraBank
// ---------------------------------------------------------------------------

sol! {
    /// Homora V2 bank: position registry, debt ledger and spell executor.
    interface IHomoraBank {
        /// Run `data` against `spell` on behalf of `positionId` (0 opens a new one).
        function execute(uint256 positionId, address spell, bytes data) external payable returns (uint256);

        function getPositionInfo(uint256 positionId) external view returns (
            address owner,
            address collToken,
            uint256 collId,
            uint256 collateralSize
        );

        /// Debt including interest accrued up to the current block.
        function borrowBalanceCurrent(uint256 positionId, address token) external returns (uint256);

        function getCollateralETHValue(uint256 positionId) external view returns (uint256);

        function getBorrowETHValue(uint256 positionId) external view returns (uint256);

        function getPositionDebts(uint256 positionId) external view returns (
            address[] tokens,
            uint256[] debts
        );
    }
}

// ---------------------------------------------------------------------------
// Spells (platform actions)
// ---------------------------------------------------------------------------

sol! {
    /// Supply/borrow amounts of an add-liquidity spell call.
    struct Amounts {
        uint256 amtAUser;
        uint256 amtBUser;
        uint256 amtLPUser;
        uint256 amtABorrow;
        uint256 amtBBorrow;
        uint256 amtLPBorrow;
        uint256 amtAMin;
        uint256 amtBMin;
    }

    /// Withdraw/repay amounts of a remove-liquidity spell call.
    struct RepayAmounts {
        uint256 amtLPTake;
        uint256 amtLPWithdraw;
        uint256 amtARepay;
        uint256 amtBRepay;
        uint256 amtLPRepay;
        uint256 amtAMin;
        uint256 amtBMin;
    }

    /// Trader Joe spell for `WMasterChefJoeV2` pools.
    interface ITraderJoeSpell {
        function addLiquidityWMasterChef(address tokenA, address tokenB, Amounts amt, uint256 pid) external payable;
        function removeLiquidityWMasterChef(address tokenA, address tokenB, RepayAmounts amt) external;
        function harvestWMasterChef() external;
    }

    /// Trader Joe spell for `WBoostedMasterChefJoe` pools.
    interface IBoostedTraderJoeSpell {
        function addLiquidityWBoostedMasterChef(address tokenA, address tokenB, Amounts amt, uint256 pid) external payable;
        function removeLiquidityWBoostedMasterChef(address tokenA, address tokenB, RepayAmounts amt) external;
        function harvestWBoostedMasterChef() external;
    }

    /// Pangolin V2 spell for `WMiniChefV2PNG` pools.
    interface IPangolinSpellV2 {
        function addLiquidityWMiniChef(address tokenA, address tokenB, Amounts amt, uint256 pid) external payable;
        function removeLiquidityWMiniChef(address tokenA, address tokenB, RepayAmounts amt) external;
        function harvestWMiniChefRewards() external;
    }
}

// ---------------------------------------------------------------------------
// Staking wrappers (ERC-1155 collateral)
// ---------------------------------------------------------------------------

sol! {
    /// Common decoder of `WMasterChefJoeV2` and `WMiniChefV2PNG` collateral ids.
    interface IWrappedChef {
        function decodeId(uint256 id) external pure returns (uint256 pid, uint256 rewardPerShare);
    }

    interface IWBoostedMasterChefJoe {
        function decodeId(uint256 id) external pure returns (uint256 pid, uint256 joePerShare);
        /// Wrapper-level accumulated JOE per share.
        function accJoePerShare() external view returns (uint256);
    }
}

// ---------------------------------------------------------------------------
// Staking contracts
// ---------------------------------------------------------------------------

sol! {
    interface IMasterChefJoeV2 {
        function poolInfo(uint256 pid) external view returns (
            address lpToken,
            uint256 allocPoint,
            uint256 lastRewardTimestamp,
            uint256 accJoePerShare,
            address rewarder
        );
    }

    interface IBoostedMasterChefJoe {
        function poolInfo(uint256 pid) external view returns (
            address lpToken,
            uint96 allocPoint,
            uint256 accJoePerShare,
            uint256 accJoePerFactorPerShare,
            uint64 lastRewardTimestamp,
            address rewarder,
            uint32 veJoeShareBp,
            uint256 totalFactor,
            uint256 totalLpSupply
        );

        function userInfo(uint256 pid, address user) external view returns (
            uint256 amount,
            uint256 rewardDebt,
            uint256 factor
        );
    }

    interface IMiniChefV2 {
        function poolInfo(uint256 pid) external view returns (
            uint128 accRewardPerShare,
            uint64 lastRewardTime,
            uint64 allocPoint
        );

        function lpToken(uint256 pid) external view returns (address);
    }
}

// ---------------------------------------------------------------------------
// Oracles
// ---------------------------------------------------------------------------

sol! {
    /// Cross-validating oracle; reverts when its sources disagree.
    interface ISafeOracle {
        function getSafeETHPx(address token) external view returns (uint256);
    }

    interface IAggregatorOracle {
        /// UQ112.112 price of one raw token unit in the native asset, 18-decimal normalized.
        function getETHPx(address token) external view returns (uint256);
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

sol! {
    interface IUniswapV2Pair {
        function getReserves() external view returns (
            uint112 reserve0,
            uint112 reserve1,
            uint32 blockTimestampLast
        );
        function totalSupply() external view returns (uint256);
        function token0() external view returns (address);
        function token1() external view returns (address);
    }

    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}
