//! Procedural macros for the Mawar Finance end-to-end test harness.
use proc_macro::TokenStream;


/// Defines an end-to-end test against a running Stylus node, injecting a
/// freshly funded account for every argument.
///
/// Each argument's type must provide `async fn new() -> eyre::Result<Self>`,
/// which [`e2e::Account`] does. The test function must be `async` and return
/// `eyre::Result<()>`.
///
/// # Examples
///
/// ```rust,ignore
/// #[e2e::test]
/// async fn buys_tokens(alice: Account, bob: Account) -> eyre::Result<()> {
///     let contracts = deploy_all(&alice).await?;
///     let exchange = Exchange::new(contracts.exchange, &bob.wallet);
///     let _ = receipt!(exchange.buyMFI(bob.address()).value(value))?;
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn test(attr: TokenStream, input: TokenStream) -> TokenStream {
    test::test(&attr, input)
}
