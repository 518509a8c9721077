use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    DeriveInput, Path, Token,
    parse::Parse,
    parse_macro_input,
    punctuated::Punctuated,
};

/// Derive macro for implementing `Behavior`.
///
/// Capabilities are listed as trait paths; each is registered as
/// `dyn Trait` with an identity cast.
///
/// ```rust,ignore
/// #[derive(Behavior)]
/// #[behavior(capabilities(Armor, Weapon))]
/// struct Tank {
///     health: i32,
/// }
/// ```
#[proc_macro_derive(Behavior, attributes(behavior))]
pub fn derive_behavior(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_behavior(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_behavior(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let capabilities = parse_capabilities(input)?;

    Ok(quote! {
        impl #impl_generics ::herald::Behavior for #name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn register_capabilities(capabilities: &mut ::herald::Capabilities<Self>) {
                #(
                    capabilities.add::<dyn #capabilities>(|behavior| behavior);
                )*
            }
        }
    })
}

fn parse_capabilities(input: &DeriveInput) -> syn::Result<Vec<Path>> {
    let mut capabilities = Vec::new();

    for attr in input.attrs.iter().filter(|a| a.path().is_ident("behavior")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("capabilities") {
                let content;
                syn::parenthesized!(content in meta.input);
                let paths: Punctuated<Path, Token![,]> =
                    content.parse_terminated(Path::parse, Token![,])?;
                for path in paths {
                    if capabilities.contains(&path) {
                        return Err(syn::Error::new_spanned(
                            &path,
                            "capability listed more than once",
                        ));
                    }
                    capabilities.push(path);
                }
                Ok(())
            } else {
                Err(meta.error("unknown behavior attribute, expected `capabilities(...)`"))
            }
        })?;
    }

    Ok(capabilities)
}
