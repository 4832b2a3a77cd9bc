extern crate proc_macro;

use itertools::izip;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, parse_quote, Attribute, Data, DataEnum, DeriveInput, Fields, Ident, Type,
};

/// Container attributes parsed from `#[posgraph(...)]` on the struct or enum itself.
#[derive(Debug, Default)]
struct ContainerAttributes {
    /// Value-owned composite (`Struct`): always present, no presence byte.
    value: bool,
    type_name: Option<String>,
}

/// Field attributes parsed from `#[posgraph(...)]`.
///
/// * `skip` - The field is not part of the layout and is rebuilt with `Default::default()`
/// * `rename` - The field name recorded in the descriptor
#[derive(Debug, Default)]
struct FieldAttributes {
    skip: bool,
    rename: Option<String>,
}

fn get_container_attributes(attrs: &[Attribute]) -> syn::Result<ContainerAttributes> {
    let mut parsed = ContainerAttributes::default();
    for attr in attrs {
        if !attr.path().is_ident("posgraph") {
            continue;
        }
        attr.parse_args_with(|input: syn::parse::ParseStream| {
            while !input.is_empty() {
                let ident = input.parse::<Ident>()?;
                if ident == "value" {
                    parsed.value = true;
                } else if ident == "type_name" {
                    input.parse::<syn::Token![=]>()?;
                    let lit = input.parse::<syn::LitStr>()?;
                    if lit.value().is_empty() {
                        return Err(syn::Error::new(lit.span(), "type_name must not be empty"));
                    }
                    parsed.type_name = Some(lit.value());
                } else {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("Unknown container attribute: {}", ident),
                    ));
                }

                if input.peek(syn::Token![,]) {
                    input.parse::<syn::Token![,]>()?;
                }
            }
            Ok(())
        })?;
    }
    Ok(parsed)
}

fn get_field_attributes(attrs: &[Attribute]) -> syn::Result<FieldAttributes> {
    let mut parsed = FieldAttributes::default();
    for attr in attrs {
        if !attr.path().is_ident("posgraph") {
            continue;
        }
        attr.parse_args_with(|input: syn::parse::ParseStream| {
            while !input.is_empty() {
                let ident = input.parse::<Ident>()?;
                if ident == "skip" {
                    parsed.skip = true;
                } else if ident == "rename" {
                    input.parse::<syn::Token![=]>()?;
                    parsed.rename = Some(input.parse::<syn::LitStr>()?.value());
                } else {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("Unknown field attribute: {}", ident),
                    ));
                }

                if input.peek(syn::Token![,]) {
                    input.parse::<syn::Token![,]>()?;
                }
            }
            Ok(())
        })?;
    }
    Ok(parsed)
}

/// Derive macro for implementing the `Schema` trait
///
/// Structs (named, tuple and unit) become composites whose fields are laid out in declaration
/// order. Fieldless enums are stored as their `#[repr]` integer (`i32` by default).
///
/// # Supported Attributes
///
/// * `#[posgraph(value)]` - Value-owned composite, never absent and without presence byte
/// * `#[posgraph(type_name = "name")]` - Explicit identity name for the envelope tag
/// * `#[posgraph(skip)]` - Field excluded from the layout
/// * `#[posgraph(rename = "name")]` - Field name recorded in the descriptor
///
/// # Examples
///
/// ```rust,ignore
/// #[derive(Schema)]
/// struct MyStruct {
///     field1: i32,
///     #[posgraph(skip)]
///     cache: Vec<u8>,
/// }
/// ```
#[proc_macro_derive(Schema, attributes(posgraph))]
pub fn derive_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_schema(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_schema(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let container = get_container_attributes(&input.attrs)?;

    let mut generics = input.generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!(posgraph::Schema));
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let type_name = match &container.type_name {
        Some(explicit) => quote! { #explicit },
        None => quote! { ::std::any::type_name::<Self>() },
    };

    let body = match &input.data {
        Data::Struct(s) => expand_struct(&s.fields, &container, &type_name)?,
        Data::Enum(e) => {
            if container.value {
                return Err(syn::Error::new_spanned(
                    name,
                    "#[posgraph(value)] applies to structs only",
                ));
            }
            expand_enum(name, e, &input.attrs, &type_name)?
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                name,
                "Schema cannot be derived for unions",
            ))
        }
    };

    Ok(quote! {
        impl #impl_generics posgraph::Schema for #name #ty_generics #where_clause {
            #body
        }
    })
}

fn expand_struct(
    fields: &Fields,
    container: &ContainerAttributes,
    type_name: &TokenStream2,
) -> syn::Result<TokenStream2> {
    let ownership = if container.value {
        quote! { posgraph::Ownership::Value }
    } else {
        quote! { posgraph::Ownership::Reference }
    };

    let mut accessors = Vec::new();
    let mut names = Vec::new();
    let mut types: Vec<&Type> = Vec::new();
    let mut attrs = Vec::new();
    for (i, f) in fields.iter().enumerate() {
        let accessor = match &f.ident {
            Some(ident) => quote! { #ident },
            None => {
                let index = syn::Index::from(i);
                quote! { #index }
            }
        };
        let field_attrs = get_field_attributes(&f.attrs)?;
        let field_name = match (&field_attrs.rename, &f.ident) {
            (Some(rename), _) => rename.clone(),
            (None, Some(ident)) => ident.to_string().trim_start_matches("r#").to_string(),
            (None, None) => i.to_string(),
        };
        accessors.push(accessor);
        names.push(field_name);
        types.push(&f.ty);
        attrs.push(field_attrs);
    }

    let mut field_descriptors = Vec::new();
    let mut field_values = Vec::new();
    let mut field_inits = Vec::new();
    for (accessor, field_name, ty, field_attrs) in izip!(&accessors, &names, &types, &attrs) {
        if field_attrs.skip {
            field_inits.push(quote! { ::std::default::Default::default() });
            continue;
        }
        field_descriptors.push(quote! {
            posgraph::FieldDescriptor::new(#field_name, <#ty as posgraph::Schema>::descriptor)
        });
        field_values.push(quote! {
            posgraph::Schema::to_value(&self.#accessor)
        });
        field_inits.push(quote! {
            <#ty as posgraph::Schema>::from_value(posgraph::value::next_field(&mut fields, type_name)?)?
        });
    }

    let construct = match fields {
        Fields::Named(_) => {
            let idents = accessors.iter();
            quote! { Self { #(#idents: #field_inits,)* } }
        }
        Fields::Unnamed(_) => quote! { Self(#(#field_inits,)*) },
        Fields::Unit => quote! { Self },
    };
    let rebuild = if field_values.is_empty() {
        quote! {
            posgraph::Record::expect::<Self>(value)?;
            Ok(#construct)
        }
    } else {
        quote! {
            let record = posgraph::Record::expect::<Self>(value)?;
            let type_name = record.type_name();
            let mut fields = record.into_fields().into_iter();
            Ok(#construct)
        }
    };

    Ok(quote! {
        fn describe() -> posgraph::TypeDescriptor {
            posgraph::TypeDescriptor::composite(
                #type_name,
                #ownership,
                ::std::vec![#(#field_descriptors),*],
            )
        }

        fn to_value(&self) -> posgraph::Value {
            posgraph::Value::Record(posgraph::Record::new(
                <Self as posgraph::Schema>::descriptor().name(),
                ::std::vec![#(#field_values),*],
            ))
        }

        fn from_value(value: posgraph::Value) -> posgraph::Result<Self> {
            #rebuild
        }
    })
}

/// Maps the `#[repr(..)]` of an enum to its scalar kind and primitive type.
fn enum_repr(name: &Ident, attrs: &[Attribute]) -> syn::Result<(Ident, Ident)> {
    let mut repr = None;
    for attr in attrs {
        if !attr.path().is_ident("repr") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if let Some(ident) = meta.path.get_ident() {
                let kind = match ident.to_string().as_str() {
                    "u8" => Some("U8"),
                    "i8" => Some("I8"),
                    "u16" => Some("U16"),
                    "i16" => Some("I16"),
                    "u32" => Some("U32"),
                    "i32" => Some("I32"),
                    "u64" => Some("U64"),
                    "i64" => Some("I64"),
                    "u128" => Some("U128"),
                    "i128" => Some("I128"),
                    "usize" | "isize" => {
                        return Err(meta.error(
                            "pointer-sized discriminants have no fixed width; use a sized repr",
                        ))
                    }
                    _ => None,
                };
                if let Some(kind) = kind {
                    repr = Some((Ident::new(kind, ident.span()), ident.clone()));
                }
            }
            // align(N), packed(N)
            if meta.input.peek(syn::token::Paren) {
                let _args;
                syn::parenthesized!(_args in meta.input);
            }
            Ok(())
        })?;
    }
    Ok(repr.unwrap_or_else(|| {
        (
            Ident::new("I32", name.span()),
            Ident::new("i32", name.span()),
        )
    }))
}

fn expand_enum(
    name: &Ident,
    data: &DataEnum,
    attrs: &[Attribute],
    type_name: &TokenStream2,
) -> syn::Result<TokenStream2> {
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            name,
            "Schema cannot be derived for enums without variants",
        ));
    }
    for v in &data.variants {
        if !matches!(v.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                v,
                "Schema can only be derived for enums whose variants carry no data",
            ));
        }
    }
    let (kind, repr) = enum_repr(name, attrs)?;
    let variants: Vec<&Ident> = data.variants.iter().map(|v| &v.ident).collect();

    // u128 discriminants above i128::MAX are reported with their raw value.
    let unknown = if repr == "u128" {
        quote! {
            let type_name = <Self as posgraph::Schema>::descriptor().name();
            match i128::try_from(discriminant) {
                Ok(value) => Err(posgraph::MalformedError::UnknownDiscriminant { type_name, value }.into()),
                Err(_) => Err(posgraph::MalformedError::InvalidScalar {
                    kind: posgraph::ScalarKind::U128,
                    reason: ::std::format!("unknown discriminant {} for enum {}", discriminant, type_name),
                }
                .into()),
            }
        }
    } else {
        quote! {
            Err(posgraph::MalformedError::UnknownDiscriminant {
                type_name: <Self as posgraph::Schema>::descriptor().name(),
                value: i128::from(discriminant),
            }
            .into())
        }
    };

    Ok(quote! {
        fn describe() -> posgraph::TypeDescriptor {
            posgraph::TypeDescriptor::enumeration(#type_name, posgraph::ScalarKind::#kind)
        }

        fn to_value(&self) -> posgraph::Value {
            let discriminant: #repr = match self {
                #(Self::#variants => Self::#variants as #repr,)*
            };
            posgraph::Value::Scalar(posgraph::Scalar::#kind(discriminant))
        }

        fn from_value(value: posgraph::Value) -> posgraph::Result<Self> {
            match value {
                posgraph::Value::Scalar(posgraph::Scalar::#kind(discriminant)) => {
                    #(
                        if discriminant == Self::#variants as #repr {
                            return Ok(Self::#variants);
                        }
                    )*
                    #unknown
                }
                other => Err(other.mismatch(<Self as posgraph::Schema>::descriptor())),
            }
        }
    })
}
