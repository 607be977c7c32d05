//! Client bindings for the Mawar Finance contracts.
#![allow(missing_docs)]
#![allow(clippy::too_many_arguments)]
use alloy::sol;

sol!(
    #[sol(rpc)]
    contract Mfi {
        function name() external view returns (string name);
        function symbol() external view returns (string symbol);
        function decimals() external view returns (uint8 decimals);
        function totalSupply() external view returns (uint256 totalSupply);
        function balanceOf(address account) external view returns (uint256 balance);
        function transfer(address to, uint256 value) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256 allowance);
        function approve(address spender, uint256 value) external returns (bool);
        function transferFrom(address from, address to, uint256 value) external returns (bool);

        error ERC20InsufficientBalance(address sender, uint256 balance, uint256 needed);
        error ERC20InvalidSender(address sender);
        error ERC20InvalidReceiver(address receiver);
        error ERC20InsufficientAllowance(address spender, uint256 allowance, uint256 needed);
        error ERC20InvalidSpender(address spender);

        #[derive(Debug, PartialEq)]
        event Transfer(address indexed from, address indexed to, uint256 value);
        #[derive(Debug, PartialEq)]
        event Approval(address indexed owner, address indexed spender, uint256 value);
    }
);

sol!(
    #[sol(rpc)]
    contract SavingsNft {
        function setVaultOnce(address vault) external;
        function vault() external view returns (address vault);
        function mint(address to) external returns (uint256 tokenId);
        function burn(uint256 tokenId) external;
        function totalMinted() external view returns (uint256 totalMinted);
        function owner() external view returns (address owner);
        function balanceOf(address owner) external view returns (uint256 balance);
        function ownerOf(uint256 tokenId) external view returns (address ownerOf);

        error VaultAlreadySet(address vault);
        error InvalidVault(address vault);
        error CallerNotVault(address caller);
        error OwnableUnauthorizedAccount(address account);
        error ERC721NonexistentToken(uint256 tokenId);

        #[derive(Debug, PartialEq)]
        event VaultSet(address indexed vault);
        #[derive(Debug, PartialEq)]
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
    }
);

sol!(
    #[sol(rpc)]
    contract SavingsVault {
        function deposit(uint256 amount) external returns (uint256 tokenId);
        function previewRedeem(uint256 tokenId) external view returns (uint256 principal, uint256 fee, uint256 payout);
        function redeem(uint256 tokenId) external;
        function token() external view returns (address token);
        function nft() external view returns (address nft);
        function treasury() external view returns (address treasury);
        function feeBps() external view returns (uint16 feeBps);
        function principalOf(uint256 tokenId) external view returns (uint256 principal);

        error VaultInvalidFee(uint16 fee_bps);
        error VaultInvalidAddress(address account);
        error VaultZeroAmount();
        error VaultNonexistentPosition(uint256 token_id);
        error VaultNotPositionOwner(address caller, uint256 token_id);
        error VaultReceiptCallFailed(address nft);
        error SafeErc20FailedOperation(address token);

        #[derive(Debug, PartialEq)]
        event Deposited(address indexed owner, uint256 indexed token_id, uint256 amount);
        #[derive(Debug, PartialEq)]
        event Redeemed(address indexed owner, uint256 indexed token_id, uint256 principal, uint256 fee, uint256 payout);
    }
);

sol!(
    #[sol(rpc)]
    contract Exchange {
        function buyMFI(address recipient) external payable returns (uint256 amount);
        function quote(uint256 value) external view returns (uint256 amount);
        function withdraw(address to) external;
        function token() external view returns (address token);
        function rate() external view returns (uint256 rate);
        function owner() external view returns (address owner);

        error ExchangeInvalidToken(address token);
        error ExchangeInvalidRate(uint256 rate);
        error ExchangeInvalidRecipient(address recipient);
        error ExchangeZeroValue();
        error ExchangeInvalidQuote(uint256 value);
        error ExchangeInsufficientInventory(uint256 requested, uint256 available);
        error ExchangeTokenCallFailed(address token);
        error ExchangeWithdrawFailed(address to, uint256 amount);
        error OwnableUnauthorizedAccount(address account);

        #[derive(Debug, PartialEq)]
        event Purchased(address indexed buyer, address indexed recipient, uint256 value, uint256 amount);
        #[derive(Debug, PartialEq)]
        event Withdrawn(address indexed to, uint256 amount);
    }
);
