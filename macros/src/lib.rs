//! Procedural macros for callcount.
//!
//! # Example
//!
//! ```rust,ignore
//! use callcount::{counted, CallPublisher, HasPublisher};
//!
//! impl HasPublisher for DemoService {
//!     fn call_publisher(&self) -> &CallPublisher {
//!         &self.publisher
//!     }
//! }
//!
//! impl DemoService {
//!     #[counted(name = "sayHello")]
//!     pub fn say_hello(&self, name: &str) -> String {
//!         format!("Hello, {}!", name)
//!     }
//!
//!     #[counted]
//!     pub async fn do_work(&self) -> String {
//!         // counted as "do_work"
//!     }
//!
//!     // Not counted
//!     pub fn not_counted_method(&self) -> String {
//!         // ...
//!     }
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, parse_quote, Block, Ident, ImplItemFn, LitStr, Token};

/// Counts every call of a method.
///
/// The enclosing type must implement `callcount::HasPublisher`. One call
/// event is published when the method exits, whether it returns normally,
/// returns early, propagates an error with `?`, or panics. For `async fn`
/// the event is published when the future completes or is dropped.
///
/// # Attributes
/// - `name = "op"` - Operation identifier (defaults to the method name)
#[proc_macro_attribute]
pub fn counted(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as CountedArgs);
    let input = parse_macro_input!(item as ImplItemFn);

    expand_counted(args, input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

struct CountedArgs {
    name: Option<String>,
}

impl syn::parse::Parse for CountedArgs {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let mut name = None;

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "name" => {
                    let value: LitStr = input.parse()?;
                    if value.value().is_empty() {
                        return Err(syn::Error::new(value.span(), "name must not be empty"));
                    }
                    name = Some(value.value());
                }
                _ => return Err(syn::Error::new(ident.span(), "unknown attribute")),
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(CountedArgs { name })
    }
}

fn expand_counted(args: CountedArgs, mut method: ImplItemFn) -> syn::Result<TokenStream2> {
    if method.sig.receiver().is_none() {
        return Err(syn::Error::new_spanned(
            &method.sig.ident,
            "#[counted] requires a method with a `self` receiver; \
             wrap free functions with `CallPublisher::instrument`",
        ));
    }

    let name = args
        .name
        .unwrap_or_else(|| method.sig.ident.to_string());

    let prologue: Block = parse_quote! {{
        ::callcount::inventory::submit! {
            ::callcount::advice::CountedOperation::new(#name, ::core::module_path!())
        }

        static __CALLCOUNT_OPERATION: ::std::sync::LazyLock<::callcount::OperationId> =
            ::std::sync::LazyLock::new(|| ::callcount::OperationId::from(#name));

        let __callcount_guard = {
            use ::callcount::advice::HasPublisher as _;
            ::callcount::advice::CallPublisher::guard(
                self.call_publisher(),
                ::std::sync::LazyLock::force(&__CALLCOUNT_OPERATION).clone(),
            )
        };
    }};

    let body = std::mem::take(&mut method.block.stmts);
    method.block.stmts = prologue.stmts;
    method.block.stmts.extend(body);

    Ok(quote! { #method })
}
