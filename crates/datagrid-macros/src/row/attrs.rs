//! Attribute parsing for the GridRow derive macro.
//!
//! Parses the `#[grid(...)]` field attributes.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Lit, Meta, Result, Token,
};

/// Field-level attributes from `#[grid(...)]`.
#[derive(Debug, Clone)]
pub struct GridAttr {
    /// Leave the field out of the member table.
    pub skip: bool,
    /// Member name (default: the field name).
    pub rename: Option<String>,
    pub span: Span,
}

impl Default for GridAttr {
    fn default() -> Self {
        GridAttr {
            skip: false,
            rename: None,
            span: Span::call_site(),
        }
    }
}

impl Parse for GridAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = GridAttr::default();

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                Meta::Path(p) if p.is_ident("skip") => {
                    attr.skip = true;
                    attr.span = p.span();
                }

                Meta::NameValue(nv) if nv.path.is_ident("rename") => {
                    if let syn::Expr::Lit(syn::ExprLit {
                        lit: Lit::Str(s), ..
                    }) = &nv.value
                    {
                        if s.value().is_empty() {
                            return Err(Error::new(s.span(), "rename must not be empty"));
                        }
                        attr.rename = Some(s.value());
                        attr.span = s.span();
                    } else {
                        return Err(Error::new(
                            nv.value.span(),
                            "rename must be a string literal",
                        ));
                    }
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        "unknown grid attribute. Expected: skip or rename = \"...\"",
                    ));
                }
            }
        }

        if attr.skip && attr.rename.is_some() {
            return Err(Error::new(attr.span, "skip and rename cannot be combined"));
        }

        Ok(attr)
    }
}

/// Extract `#[grid(...)]` attributes from a field's attributes.
pub fn parse_grid_attrs(attrs: &[Attribute]) -> Result<GridAttr> {
    for attr in attrs {
        if attr.path().is_ident("grid") {
            return attr.parse_args::<GridAttr>();
        }
    }
    Ok(GridAttr::default())
}
