use heck::ToSnakeCase;
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{
    parse::{Parse, ParseStream, Result},
    punctuated::Punctuated,
    Ident, Token, Type,
};

/// Parses the following syntax:
/// ```text
/// generate_ast!(
///     $AST_NAME,
///     [$(NODE_NAME => { $($FIELD_NAME: $FIELD_TYPE),+)+ }])
/// )
/// ```
///
/// For example:
/// ```text
/// generate_ast!(
///     Expr,
///     [
///         Number => { value: isize };
///         Binary => { left: Box<Expr>, op: char, right: Box<Expr> };
///     ]
/// )
/// ```
///
/// Every node becomes a struct with public fields and a variant of the
/// `$AST_NAME` enum wrapping it. A `new_$node_name` constructor is generated
/// for each node so callers never have to spell out both layers.
struct Ast {
    name: Ident,
    nodes: Punctuated<AstNode, Token![;]>,
}

impl Parse for Ast {
    fn parse(input: ParseStream) -> Result<Self> {
        let name: Ident = input.parse()?;
        input.parse::<Token![,]>()?;
        let nodes_input;
        syn::bracketed!(nodes_input in input);
        let nodes = Punctuated::<AstNode, Token![;]>::parse_terminated(&nodes_input)?;
        Ok(Ast { name, nodes })
    }
}

struct AstNode {
    name: Ident,
    fields: Punctuated<Field, Token![,]>,
}

impl Parse for AstNode {
    fn parse(input: ParseStream) -> Result<Self> {
        let name: Ident = input.parse()?;
        input.parse::<Token![=>]>()?;
        let fields_input;
        syn::braced!(fields_input in input);
        let fields = Punctuated::<Field, Token![,]>::parse_terminated(&fields_input)?;
        Ok(AstNode { name, fields })
    }
}

struct Field {
    name: Ident,
    ty: Type,
}

impl Parse for Field {
    fn parse(input: ParseStream) -> Result<Self> {
        let name: Ident = input.parse()?;
        input.parse::<Token![:]>()?;
        let ty: Type = input.parse()?;
        Ok(Field { name, ty })
    }
}

#[proc_macro]
pub fn generate_ast(input: TokenStream) -> TokenStream {
    let Ast { name, nodes } = syn::parse_macro_input!(input);

    let node_names: Vec<_> = nodes.iter().map(|n| &n.name).collect();

    let ast_enum = quote! {
        #[derive(Debug, PartialEq, Clone)]
        pub enum #name {
            #(#node_names(#node_names)),*
        }
    };

    let node_structs = nodes.iter().map(|n| {
        let node_name = &n.name;
        let field_names = n.fields.iter().map(|f| &f.name);
        let field_types = n.fields.iter().map(|f| &f.ty);
        quote! {
            #[derive(Debug, PartialEq, Clone)]
            pub struct #node_name {
                #(pub #field_names: #field_types),*
            }
        }
    });

    let constructors = nodes.iter().map(|n| {
        let node_name = &n.name;
        let fn_name = format_ident!("new_{}", node_name.to_string().to_snake_case());
        let params = n.fields.iter().map(|f| {
            let (field, ty) = (&f.name, &f.ty);
            quote! { #field: #ty }
        });
        let field_names = n.fields.iter().map(|f| &f.name);
        quote! {
            pub fn #fn_name(#(#params),*) -> Self {
                #name::#node_name(#node_name { #(#field_names),* })
            }
        }
    });

    (quote! {
        #ast_enum
        #(#node_structs)*

        impl #name {
            #(#constructors)*
        }
    })
    .into()
}
