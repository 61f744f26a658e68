use proc_macro2::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Error, GenericArgument, Ident, LitBool, LitStr, PathArguments, Result, Type};

pub struct Field {
    syn_field: syn::Field,
    ident: Ident,
    pub id: bool,
    column: Option<LitStr>,
    unique: bool,
    nullable: Option<LitBool>,
    reference: bool,
}

impl Field {
    pub fn read(input: &syn::Field) -> Result<Field> {
        let Some(ident) = input.ident.clone() else {
            return Err(Error::new(input.span(), "unnamed field"));
        };

        let mut field = Field {
            syn_field: input.clone(),
            ident,
            id: false,
            column: None,
            unique: false,
            nullable: None,
            reference: false,
        };

        for attr in &input.attrs {
            if attr.path().is_ident("id") {
                attr.meta.require_path_only()?;
                field.id = true;
            } else if attr.path().is_ident("column") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("name") {
                        field.column = Some(meta.value()?.parse()?);
                        return Ok(());
                    }

                    if meta.path.is_ident("unique") {
                        field.unique = true;
                        return Ok(());
                    }

                    if meta.path.is_ident("nullable") {
                        field.nullable = Some(meta.value()?.parse()?);
                        return Ok(());
                    }

                    if meta.path.is_ident("reference") {
                        field.reference = true;
                        return Ok(());
                    }

                    Err(meta.error("unrecognized column attribute"))
                })?;
            }
        }

        if field.id && field.reference {
            return Err(field.error("#[id] field cannot be a reference"));
        }

        let optional = generic_argument(&input.ty, "Option").is_some();
        if field.id && !optional {
            return Err(field.error("#[id] field must be an Option"));
        }
        if field.id && field.nullable.is_some() {
            return Err(field.error("#[id] field nullability cannot be set"));
        }
        if field.nullable.as_ref().is_some_and(LitBool::value) && !optional {
            return Err(field.error("nullable column must be an Option"));
        }

        Ok(field)
    }

    pub fn error(&self, message: &str) -> Error {
        Error::new(self.syn_field.span(), message)
    }

    pub fn ident(&self) -> &Ident {
        &self.ident
    }

    pub fn name(&self) -> String {
        self.ident.to_string()
    }

    /// `FieldMetadata` builder call registering this field
    pub fn as_metadata(&self) -> Result<TokenStream> {
        let name = self.name();
        let metadata = if self.reference {
            self.reference_metadata(&name)?
        } else {
            self.value_metadata(&name)
        };

        let mut options = quote!();
        if let Some(column) = &self.column {
            options.extend(quote!(.column(#column)));
        }
        if self.unique {
            options.extend(quote!(.unique()));
        }
        if self.id {
            options.extend(quote!(.primary_key()));
        }

        Ok(quote! {
            .field(#metadata #options)
        })
    }

    fn value_metadata(&self, name: &str) -> TokenStream {
        let ident = &self.ident;
        let ty = &self.syn_field.ty;
        let nullable = match &self.nullable {
            Some(nullable) => quote!(#nullable),
            None => quote!(<#ty as ::ormanager::SqlValue>::NULLABLE),
        };

        quote! {
            ::ormanager::FieldMetadata::<Self>::new(
                #name,
                <#ty as ::ormanager::SqlValue>::SQL_TYPE,
                ::ormanager::Accessor::<Self>::Value {
                    get: |entity: &Self| ::ormanager::SqlValue::to_value(&entity.#ident),
                    set: |entity: &mut Self, value| {
                        entity.#ident = ::ormanager::SqlValue::from_value(value)?;
                        ::core::result::Result::Ok(())
                    },
                },
            )
            .nullable(#nullable)
        }
    }

    fn reference_metadata(&self, name: &str) -> Result<TokenStream> {
        let ident = &self.ident;
        let Some((target, boxed)) = reference_target(&self.syn_field.ty) else {
            return Err(self.error("reference must be an Option<T> or Option<Box<T>>"));
        };
        let nullable = match &self.nullable {
            Some(nullable) => quote!(#nullable),
            None => quote!(true),
        };

        let (borrow, wrap) = if boxed {
            (quote!(as_deref), quote!(.map(::std::boxed::Box::new)))
        } else {
            (quote!(as_ref), quote!())
        };

        Ok(quote! {
            ::ormanager::FieldMetadata::<Self>::new(
                #name,
                ::ormanager::SqlType::Reference,
                ::ormanager::Accessor::<Self>::Reference {
                    key: |entity: &Self| {
                        ::ormanager::entity::reference_key::<#target>(entity.#ident.#borrow())
                    },
                    load: |entity: &mut Self, loader, id| {
                        entity.#ident = loader.load::<#target>(id)#wrap;
                    },
                },
            )
            .nullable(#nullable)
        })
    }
}

/// `T` out of `Option<T>` or `Option<Box<T>>`, with whether it is boxed
fn reference_target(ty: &Type) -> Option<(&Type, bool)> {
    let inner = generic_argument(ty, "Option")?;

    match generic_argument(inner, "Box") {
        Some(target) => Some((target, true)),
        None => Some((inner, false)),
    }
}

fn generic_argument<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }

    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return None;
    };
    match arguments.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}
