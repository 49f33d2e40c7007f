use proc_macro::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{parse_macro_input, parse_quote, Attribute, Ident, Item, LitStr, Token, Type};

use crate::utils::{create_str_literal_from_ident, error, has_name, parse_name, parse_separator};

pub fn derive_command(command: TokenStream) -> TokenStream {
    let item = parse_macro_input!(command as Item);

    let CommandInfo {
        type_name,
        command_name,
        output,
    } = match item.try_into() {
        Ok(info) => info,
        Err(error) => return error,
    };

    TokenStream::from(quote! {
        impl missive::Command for #type_name {
            const NAME: &'static str = #command_name;
            type Output = #output;
        }
    })
}

struct CommandInfo {
    type_name: Ident,
    command_name: LitStr,
    output: Type,
}

impl CommandInfo {
    fn try_from(type_name: Ident, attributes: &[Attribute]) -> Result<Self, TokenStream> {
        let arguments =
            DeriveCommandArguments::try_from(attributes).map_err(syn::Error::into_compile_error)?;
        let command_name = arguments
            .command_name
            .unwrap_or_else(|| create_str_literal_from_ident(&type_name));
        let output = arguments.output.unwrap_or_else(|| parse_quote! { () });
        Ok(CommandInfo {
            type_name,
            command_name,
            output,
        })
    }
}

impl TryFrom<Item> for CommandInfo {
    type Error = TokenStream;

    fn try_from(item: Item) -> Result<Self, Self::Error> {
        match item {
            Item::Struct(item) => CommandInfo::try_from(item.ident, &item.attrs),
            Item::Enum(item) => CommandInfo::try_from(item.ident, &item.attrs),
            _ => Err(error(
                item,
                "Command can only be derived for a struct or an enum",
            )),
        }
    }
}

#[derive(Default)]
struct DeriveCommandArguments {
    command_name: Option<LitStr>,
    output: Option<Type>,
}

impl Parse for DeriveCommandArguments {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut arguments = DeriveCommandArguments::default();

        while !input.is_empty() {
            let ident = input.parse::<Ident>()?;
            match ident.to_string().as_str() {
                "name" => arguments.command_name = Some(parse_name(input)?),
                "output" => {
                    input.parse::<Token![=]>()?;
                    arguments.output = Some(input.parse()?);
                }
                _ => return Err(syn::Error::new_spanned(ident, "unexpected argument")),
            }
            parse_separator(input)?;
        }

        Ok(arguments)
    }
}

impl TryFrom<&[Attribute]> for DeriveCommandArguments {
    type Error = syn::Error;

    fn try_from(attributes: &[Attribute]) -> Result<Self, Self::Error> {
        for attribute in attributes {
            if has_name(attribute, "missive") {
                return attribute.parse_args();
            }
        }
        Ok(DeriveCommandArguments::default())
    }
}
