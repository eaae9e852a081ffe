//! Read-only views of the Base `Bridge` and `BridgeValidator` contracts.

rpc_sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface BridgeValidator {
        /// Whether the message hash was attested by the validator set.
        function validMessages(bytes32 messageHash) external view returns (bool);
    }
}

rpc_sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface Bridge {
        /// Whether the message was relayed and executed successfully.
        function successes(bytes32 messageHash) external view returns (bool);
        /// Whether the last relay attempt of the message failed.
        function failures(bytes32 messageHash) external view returns (bool);
    }
}
