extern crate proc_macro;
use proc_macro::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{parse_macro_input, Expr, Ident, Result, Token};

/// Identifiers that are treated as register operands, everything else is a rust expression
const REGISTERS: [&str; 4] = ["EAX", "EBX", "ECX", "EDX"];

#[derive(Debug)]
struct AsmStatements {
    pub stream: Ident,
    pub statements: Vec<AsmStatement>,
}

#[derive(Debug)]
enum Operand {
    /// Everything that doesn't fit
    Expr(Expr),
    /// EAX/others
    Register(Ident),
}

#[derive(Debug)]
struct AsmStatement {
    mnemonic: Ident,
    operands: Vec<Operand>,
}

fn peek_register(input: ParseStream) -> bool {
    match input.cursor().ident() {
        Some((ident, _)) => REGISTERS.contains(&ident.to_string().as_str()),
        None => false,
    }
}

fn parse_operands(input: ParseStream) -> Result<Vec<Operand>> {
    let mut result = vec![];

    // no operands
    if input.peek(Token![;]) {
        input.parse::<Token![;]>()?;
        return Ok(result);
    }

    loop {
        if peek_register(input) {
            result.push(Operand::Register(input.parse()?));
        } else {
            result.push(Operand::Expr(input.parse()?));
        }

        if input.peek(Token![;]) {
            input.parse::<Token![;]>()?;
            break Ok(result);
        } else {
            input.parse::<Token![,]>()?;
        }
    }
}

impl Parse for AsmStatements {
    fn parse(input: ParseStream) -> Result<Self> {
        let stream: Ident = input.parse()?;
        input.parse::<Token![:]>()?;

        let mut statements = vec![];
        while !input.is_empty() {
            let mnemonic: Ident = input.parse()?;
            let operands = parse_operands(input)?;
            statements.push(AsmStatement { mnemonic, operands });
        }

        Ok(AsmStatements { stream, statements })
    }
}

fn encode_operand(operand: Operand) -> proc_macro2::TokenStream {
    match operand {
        Operand::Register(ident) => quote! { Register::#ident },
        Operand::Expr(expr) => quote! { #expr },
    }
}

/// Emits IA-32 instructions into an `InstructionStream`.
///
/// ```ignore
/// asm_ia32! {
///     stream:
///     mov EAX, 1;
///     int 0x80;
/// }
/// ```
/// expands to `ops::mov(&mut stream, Register::EAX, 1); ops::int(&mut stream, 0x80);`
/// so `ops` and `Register` have to be in scope.
#[proc_macro]
pub fn asm_ia32(stream: TokenStream) -> TokenStream {
    let input = parse_macro_input!(stream as AsmStatements);
    let target = input.stream;

    input
        .statements
        .into_iter()
        .map(|AsmStatement { mnemonic, operands }| -> TokenStream {
            let operands = operands.into_iter().map(encode_operand);
            quote! {
                ops::#mnemonic(&mut #target, #(#operands),*);
            }
            .into()
        })
        .collect()
}
