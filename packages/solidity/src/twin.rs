//! Entry point of the Twin adapter that prices and authorizes bridged actions.

alloy_sol_types::sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface ITwin {
        function execute(
            bytes32 actionId,
            bytes calldata actionData,
            address swapTarget,
            bytes calldata swapData
        ) external payable;
    }
}
