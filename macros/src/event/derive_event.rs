use proc_macro::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{parse_macro_input, Attribute, Ident, Item, LitStr};

use crate::utils::{create_str_literal_from_ident, error, has_name, parse_name};

pub fn derive_event(event: TokenStream) -> TokenStream {
    let item = parse_macro_input!(event as Item);

    let (type_name, attributes) = match item {
        Item::Struct(item) => (item.ident, item.attrs),
        Item::Enum(item) => (item.ident, item.attrs),
        _ => return error(item, "Event can only be derived for a struct or an enum"),
    };

    let arguments = match DeriveEventArguments::try_from(attributes.as_slice()) {
        Ok(arguments) => arguments,
        Err(error) => return error.into_compile_error().into(),
    };

    let event_name = arguments
        .event_name
        .unwrap_or_else(|| create_str_literal_from_ident(&type_name));

    TokenStream::from(quote! {
        impl missive::Event for #type_name {
            const NAME: &'static str = #event_name;
        }
    })
}

#[derive(Default)]
struct DeriveEventArguments {
    event_name: Option<LitStr>,
}

impl Parse for DeriveEventArguments {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.is_empty() {
            Ok(DeriveEventArguments::default())
        } else {
            let argument = input.parse::<Ident>()?;
            if argument != "name" {
                Err(syn::Error::new_spanned(argument, "unexpected argument"))
            } else {
                Ok(DeriveEventArguments {
                    event_name: Some(parse_name(input)?),
                })
            }
        }
    }
}

impl TryFrom<&[Attribute]> for DeriveEventArguments {
    type Error = syn::Error;

    fn try_from(attributes: &[Attribute]) -> Result<Self, Self::Error> {
        for attribute in attributes {
            if has_name(attribute, "missive") {
                return attribute.parse_args();
            }
        }
        Ok(DeriveEventArguments::default())
    }
}
