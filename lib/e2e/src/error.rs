use alloy::sol_types::SolError;

use crate::deploy::{StylusDeployerError, DEPLOYMENT_REVERTED};

/// Assertions over a failed contract call.
pub trait Revert {
    /// Checks that the call was rejected by the contract, whatever the
    /// reason.
    fn reverted(&self) -> bool;

    /// Checks that the call reverted with exactly the abi-encoded `expected`
    /// error.
    fn reverted_with<E: SolError>(&self, expected: E) -> bool;
}

impl Revert for alloy::contract::Error {
    fn reverted(&self) -> bool {
        if self.as_revert_data().is_some() {
            return true;
        }

        //  ErrorResp(
        //      ErrorPayload {
        //          code: -32000,
        //          message: "execution reverted",
        //          data: None,
        //      },
        //  )
        let Self::TransportError(e) = self else {
            return false;
        };
        e.as_error_resp()
            .is_some_and(|payload| payload.message.contains("revert"))
    }

    fn reverted_with<E: SolError>(&self, expected: E) -> bool {
        self.as_revert_data()
            .is_some_and(|data| data.as_ref() == expected.abi_encode())
    }
}

impl Revert for eyre::Report {
    fn reverted(&self) -> bool {
        if let Some(err) = self.downcast_ref::<alloy::contract::Error>() {
            return err.reverted();
        }
        StylusDeployerError::from_report(self).is_some()
            || deployment_revert_data(self).is_some()
    }

    fn reverted_with<E: SolError>(&self, expected: E) -> bool {
        if let Some(err) = self.downcast_ref::<alloy::contract::Error>() {
            return err.reverted_with(expected);
        }
        let expected = alloy::hex::encode(expected.abi_encode());
        if let Some(err) = StylusDeployerError::from_report(self) {
            return err.revert_data.eq_ignore_ascii_case(&expected);
        }
        deployment_revert_data(self)
            .is_some_and(|data| data.eq_ignore_ascii_case(&expected))
    }
}

/// Hex revert data of a deployment that failed with [`DEPLOYMENT_REVERTED`].
fn deployment_revert_data(report: &eyre::Report) -> Option<String> {
    report.chain().find_map(|cause| {
        let message = cause.to_string();
        message.strip_prefix(DEPLOYMENT_REVERTED).map(str::to_owned)
    })
}

#[cfg(test)]
mod tests {
    use alloy::{
        primitives::{address, Address},
        sol,
        sol_types::SolError,
    };
    use eyre::WrapErr;

    use super::Revert;
    use crate::deploy::{StylusDeployerError, DEPLOYMENT_REVERTED};

    sol! {
        error ContractInitializationError(address);
        error VaultInvalidFee(uint16 fee_bps);
    }

    const CONTRACT: Address =
        address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");

    fn initialization_failure() -> eyre::Report {
        let data = ContractInitializationError { _0: CONTRACT }.abi_encode();
        eyre::Report::new(StylusDeployerError {
            contract_address: CONTRACT,
            revert_data: alloy::hex::encode(data),
        })
    }

    #[test]
    fn initialization_failure_is_a_revert() {
        let err: eyre::Result<()> = Err(initialization_failure());
        let err = err.wrap_err("failed to deploy savings-vault").unwrap_err();

        assert!(err.reverted());
        assert!(
            err.reverted_with(ContractInitializationError { _0: CONTRACT })
        );
        assert!(!err.reverted_with(ContractInitializationError {
            _0: Address::ZERO
        }));
        assert!(!err.reverted_with(VaultInvalidFee { fee_bps: 10_001 }));
    }

    #[test]
    fn raw_deployment_revert_matches_its_data() {
        let data = alloy::hex::encode_upper(
            VaultInvalidFee { fee_bps: 10_001 }.abi_encode(),
        );
        let err = eyre::eyre!("{DEPLOYMENT_REVERTED}{data}");

        assert!(err.reverted());
        assert!(err.reverted_with(VaultInvalidFee { fee_bps: 10_001 }));
        assert!(!err.reverted_with(VaultInvalidFee { fee_bps: 10_000 }));
    }

    #[test]
    fn unrelated_failure_mentioning_revert_is_not_a_revert() {
        let err = eyre::eyre!("failed to read reverted-deployments.json");

        assert!(!err.reverted());
        assert!(
            !err.reverted_with(ContractInitializationError { _0: CONTRACT })
        );
    }
}
