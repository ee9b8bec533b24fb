use proc_macro::TokenStream;
use proc_macro2::Ident;
use quote::quote;
use syn::{
    parse::Parse, parse_macro_input, Data, DeriveInput, Expr, GenericArgument, LitStr, Path,
    PathArguments, PathSegment, Token, Type, TypePath,
};

fn extract_type_from_option(ty: &syn::Type) -> Option<&syn::Type> {
    fn extract_type_path(ty: &syn::Type) -> Option<&Path> {
        match *ty {
            syn::Type::Path(ref typepath) if typepath.qself.is_none() => Some(&typepath.path),
            _ => None,
        }
    }

    fn extract_option_segment(path: &Path) -> Option<&PathSegment> {
        let idents_of_path = path.segments.iter().fold(String::new(), |mut acc, v| {
            acc.push_str(&v.ident.to_string());
            acc.push('|');
            acc
        });
        ["Option|", "std|option|Option|", "core|option|Option|"]
            .into_iter()
            .find(|s| idents_of_path == *s)
            .and_then(|_| path.segments.last())
    }

    extract_type_path(ty)
        .and_then(extract_option_segment)
        .and_then(|path_seg| {
            let type_params = &path_seg.arguments;
            match *type_params {
                PathArguments::AngleBracketed(ref params) => params.args.first(),
                _ => None,
            }
        })
        .and_then(|generic_arg| match *generic_arg {
            GenericArgument::Type(ref ty) => Some(ty),
            _ => None,
        })
}

fn field_getter(
    name: &Ident,
    ty: &Type,
    key: &LitStr,
    default: &Option<Expr>,
) -> proc_macro2::TokenStream {
    match ty {
        Type::Path(TypePath { path, .. }) if path.segments.last().unwrap().ident == "Option" => {
            assert!(default.is_none());
            let generic = extract_type_from_option(ty).unwrap();
            quote!(
                let #name = dict.get::<#generic>(#key, resolver)?;
            )
        }
        _ => {
            if let Some(default) = default {
                quote!(
                    let #name = dict.get::<#ty>(#key, resolver)?.unwrap_or(#default);
                )
            } else {
                quote!(
                    let #name = dict.expect::<#ty>(#key, resolver)?;
                )
            }
        }
    }
}

struct PdfDictObjField {
    name: Ident,
    ty: Type,
    /// `None` for a bare `#[field]`, which captures the underlying stream
    key: Option<LitStr>,
    default: Option<Expr>,
}

struct HelperArgs {
    key: LitStr,
    default: Option<Expr>,
}

impl Parse for HelperArgs {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let key = input.parse()?;

        let default = if input.is_empty() {
            None
        } else {
            let _comma: Token![,] = input.parse()?;
            let _default_ident = input.parse::<Ident>()?;
            let _eq = input.parse::<Token![=]>()?;
            Some(input.parse::<Expr>()?)
        };

        Ok(HelperArgs { key, default })
    }
}

pub fn pdf_obj_inner(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = input.ident;

    let fields = match input.data {
        Data::Struct(data_struct) => data_struct.fields.into_iter().map(|field| {
            let name = field.ident.unwrap();
            let ty = field.ty;
            let field_attr = field
                .attrs
                .into_iter()
                .find(|attr| attr.path().is_ident("field"))
                .unwrap();

            let nested = match &field_attr.meta {
                syn::Meta::Path(..) => None,
                _ => Some(field_attr.parse_args_with(HelperArgs::parse).unwrap()),
            };

            let (key, default) = match nested {
                Some(HelperArgs { key, default }) => (Some(key), default),
                None => (None, None),
            };

            PdfDictObjField {
                name,
                ty,
                key,
                default,
            }
        }),
        _ => todo!(),
    }
    .collect::<Vec<PdfDictObjField>>();

    let captures_stream = fields.iter().any(|v| v.key.is_none());

    let keyed_fields = fields.iter().filter(|v| v.key.is_some()).collect::<Vec<_>>();

    let mut field_name = keyed_fields.iter().map(|v| &v.name).collect::<Vec<_>>();

    let getters = keyed_fields
        .iter()
        .map(|field| {
            field_getter(
                &field.name,
                &field.ty,
                field.key.as_ref().unwrap(),
                &field.default,
            )
        })
        .collect::<Vec<_>>();

    let has_other = field_name.iter().any(|field| *field == "other");

    if has_other {
        field_name.retain(|field| *field != "other");
    }

    let body = if captures_stream {
        let stream_field = fields.iter().find(|v| v.key.is_none()).unwrap();
        let stream_name = &stream_field.name;

        // stream-backed dictionaries keep their leftover entries on the
        // stream dict, so no emptiness check is made here
        quote!(
            let mut #stream_name = resolver.assert_stream(obj)?;

            {
                let dict = &mut #stream_name.dict.other;

                #(
                    #getters
                )*

                Ok(Self {
                    #(
                        #field_name,
                    )*
                    #stream_name,
                })
            }
        )
    } else if has_other {
        quote!(
            let mut dict = resolver.assert_dict(obj)?;

            #(
                #getters
            )*

            Ok(Self {
                #(
                    #field_name,
                )*
                other: dict,
            })
        )
    } else {
        quote!(
            let mut dict = resolver.assert_dict(obj)?;

            #(
                #getters
            )*

            crate::assert_empty(dict);

            Ok(Self {
                #(
                    #field_name,
                )*
            })
        )
    };

    quote!(
        impl crate::FromObj for #name {
            fn from_obj(obj: crate::Object, resolver: &mut dyn crate::Resolve) -> crate::PdfResult<Self> {
                let obj = resolver.resolve(obj)?;

                #body
            }
        }
    )
    .into()
}
