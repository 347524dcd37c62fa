use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{Attribute, Data, DeriveInput, Expr, ExprLit, Fields, Ident, Lit, Token, Variant};

struct VariantSpec {
    ident: Ident,
    fields: Fields,
    status: TokenStream,
    message: Option<String>,
}

pub(crate) fn expand(input: DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let Data::Enum(data_enum) = &input.data else {
        return Err(syn::Error::new_spanned(
            name,
            "HttpError can only be derived for enums",
        ));
    };

    let specs = data_enum
        .variants
        .iter()
        .map(parse_variant)
        .collect::<syn::Result<Vec<_>>>()?;

    let code_arms = specs.iter().map(|spec| {
        let ident = &spec.ident;
        let status = &spec.status;
        match spec.fields {
            Fields::Unit => quote! { Self::#ident => #status, },
            Fields::Unnamed(_) => quote! { Self::#ident(..) => #status, },
            Fields::Named(_) => quote! { Self::#ident { .. } => #status, },
        }
    });

    let message_arms = specs
        .iter()
        .map(message_arm)
        .collect::<syn::Result<Vec<_>>>()?;

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            pub fn http_code(&self) -> http::StatusCode {
                match self {
                    #(#code_arms)*
                }
            }

            pub fn http_message(&self) -> String {
                match self {
                    #(#message_arms)*
                }
            }
        }
    })
}

fn parse_variant(variant: &Variant) -> syn::Result<VariantSpec> {
    let attr = find_attr(&variant.attrs).ok_or_else(|| {
        syn::Error::new_spanned(
            &variant.ident,
            "missing #[http_error(STATUS)] or #[http_error(STATUS, \"message\")]",
        )
    })?;

    let args = attr.parse_args_with(Punctuated::<Expr, Token![,]>::parse_terminated)?;
    let mut args = args.into_iter();

    let status = match args.next() {
        Some(Expr::Path(path)) => {
            let code = &path.path;
            quote! { http::StatusCode::#code }
        }
        Some(Expr::Lit(ExprLit {
            lit: Lit::Int(int_lit),
            ..
        })) => {
            let code = int_lit.base10_parse::<u16>()?;
            if !(100..=999).contains(&code) {
                return Err(syn::Error::new_spanned(
                    int_lit,
                    "status code must be between 100 and 999",
                ));
            }
            quote! {
                http::StatusCode::from_u16(#code)
                    .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
        Some(other) => {
            return Err(syn::Error::new_spanned(
                other,
                "expected a StatusCode constant or a numeric status",
            ))
        }
        None => return Err(syn::Error::new_spanned(attr, "expected a status code")),
    };

    let message = match args.next() {
        Some(Expr::Lit(ExprLit {
            lit: Lit::Str(str_lit),
            ..
        })) => Some(str_lit.value()),
        Some(other) => {
            return Err(syn::Error::new_spanned(
                other,
                "expected a string literal message",
            ))
        }
        None => None,
    };

    if let Some(extra) = args.next() {
        return Err(syn::Error::new_spanned(
            extra,
            "http_error accepts at most two arguments",
        ));
    }

    Ok(VariantSpec {
        ident: variant.ident.clone(),
        fields: variant.fields.clone(),
        status,
        message,
    })
}

fn find_attr(attrs: &[Attribute]) -> Option<&Attribute> {
    attrs.iter().find(|attr| attr.path().is_ident("http_error"))
}

fn message_arm(spec: &VariantSpec) -> syn::Result<TokenStream> {
    let ident = &spec.ident;

    let Some(message) = &spec.message else {
        return Ok(match spec.fields {
            Fields::Unit => quote! { Self::#ident => self.to_string(), },
            Fields::Unnamed(_) => quote! { Self::#ident(..) => self.to_string(), },
            Fields::Named(_) => quote! { Self::#ident { .. } => self.to_string(), },
        });
    };

    let template = Template::parse(message, &spec.ident)?;

    match &spec.fields {
        Fields::Unit => {
            if let Some(name) = template.names.first() {
                return Err(syn::Error::new_spanned(
                    &spec.ident,
                    format!("unit variant has no field `{name}` to interpolate"),
                ));
            }
            let expr = template.render(&[]);
            Ok(quote! { Self::#ident => #expr, })
        }
        Fields::Unnamed(fields) => {
            let mut bindings = Vec::with_capacity(fields.unnamed.len());
            let mut used = Vec::new();
            for index in 0..fields.unnamed.len() {
                let key = index.to_string();
                if template.names.contains(&key) {
                    let binding = positional_ident(index);
                    bindings.push(quote! { #binding });
                    used.push(binding);
                } else {
                    bindings.push(quote! { _ });
                }
            }
            if let Some(unknown) = template
                .names
                .iter()
                .find(|name| name.parse::<usize>().map_or(true, |i| i >= fields.unnamed.len()))
            {
                return Err(syn::Error::new_spanned(
                    &spec.ident,
                    format!("no tuple field `{unknown}` to interpolate"),
                ));
            }
            let expr = template.render(&used);
            Ok(quote! { Self::#ident(#(#bindings),*) => #expr, })
        }
        Fields::Named(fields) => {
            let field_names: Vec<&Ident> = fields
                .named
                .iter()
                .filter_map(|f| f.ident.as_ref())
                .collect();
            let mut used = Vec::new();
            for name in &template.names {
                let field = field_names
                    .iter()
                    .find(|f| **f == name)
                    .ok_or_else(|| {
                        syn::Error::new_spanned(
                            &spec.ident,
                            format!("no field `{name}` to interpolate"),
                        )
                    })?;
                used.push((*field).clone());
            }
            let expr = template.render(&used);
            Ok(quote! { Self::#ident { #(#used,)* .. } => #expr, })
        }
    }
}

fn positional_ident(index: usize) -> Ident {
    Ident::new(&format!("__self_{index}"), Span::call_site())
}

/// A message literal with its placeholders resolved to binding names.
struct Template {
    /// Format string with tuple indices rewritten to `__self_N`.
    format: String,
    /// Distinct placeholder names in order of first appearance, as written.
    names: Vec<String>,
}

impl Template {
    fn parse(message: &str, span_source: &Ident) -> syn::Result<Self> {
        let mut format = String::with_capacity(message.len());
        let mut names: Vec<String> = Vec::new();
        let mut chars = message.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    format.push_str("{{");
                }
                '{' => {
                    let mut inner = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => inner.push(c),
                            None => {
                                return Err(syn::Error::new_spanned(
                                    span_source,
                                    "unterminated `{` in http_error message",
                                ))
                            }
                        }
                    }
                    let (name, spec) = match inner.split_once(':') {
                        Some((name, spec)) => (name.trim(), Some(spec)),
                        None => (inner.trim(), None),
                    };
                    if name.is_empty() {
                        return Err(syn::Error::new_spanned(
                            span_source,
                            "http_error placeholders must name a field or index",
                        ));
                    }
                    if !names.iter().any(|n| n == name) {
                        names.push(name.to_string());
                    }
                    format.push('{');
                    if name.chars().all(|c| c.is_ascii_digit()) {
                        format.push_str("__self_");
                    }
                    format.push_str(name);
                    if let Some(spec) = spec {
                        format.push(':');
                        format.push_str(spec);
                    }
                    format.push('}');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    format.push_str("}}");
                }
                other => format.push(other),
            }
        }

        Ok(Template { format, names })
    }

    fn render(&self, bindings: &[Ident]) -> TokenStream {
        let format = &self.format;
        if bindings.is_empty() {
            quote! { ::std::format!(#format) }
        } else {
            quote! { ::std::format!(#format, #(#bindings = #bindings),*) }
        }
    }
}
