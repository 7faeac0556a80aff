//! Textual rendering of the IL.

use crate::il::{Block, Data, DataItem, Def, Function, IlModule, IlType, IlValue, Inst, Linkage};
use std::fmt::Write;

/// Renders an IL module as QBE-style text.
pub fn write_module(module: &IlModule) -> String {
    let mut out = String::new();
    for def in &module.definitions {
        match def {
            Def::Function(function) => write_function(&mut out, function),
            Def::Data(data) => write_data(&mut out, data),
        }
        out.push_str("\n\n");
    }
    out
}

fn write_linkage(out: &mut String, linkage: Linkage) {
    if linkage.export {
        out.push_str("export ");
    }
    if linkage.thread {
        out.push_str("thread ");
    }
}

fn write_data(out: &mut String, data: &Data) {
    write_linkage(out, data.linkage);
    let _ = write!(out, "data ${} = {{ ", data.name);
    for (i, item) in data.items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        match item {
            DataItem::Str(bytes) => {
                out.push_str("b \"");
                for &byte in bytes {
                    escape_byte(out, byte);
                }
                out.push('"');
            }
            DataItem::Byte(byte) => {
                let _ = write!(out, "b {byte}");
            }
        }
    }
    out.push_str(" }");
}

fn write_function(out: &mut String, function: &Function) {
    write_linkage(out, function.linkage);
    out.push_str("function ");
    if function.return_type != IlType::Void {
        let _ = write!(out, "{} ", function.return_type);
    }
    let _ = write!(out, "${}(", function.name);
    for (i, param) in function.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{} %{}", param.ty, param.temp.name);
    }
    out.push_str(") {\n");
    for block in &function.blocks {
        write_block(out, block);
    }
    out.push('}');
}

fn write_block(out: &mut String, block: &Block) {
    let _ = writeln!(out, "@{}", block.name);
    for inst in &block.instructions {
        write_inst(out, inst);
    }
}

fn write_inst(out: &mut String, inst: &Inst) {
    out.push('\t');
    match inst {
        Inst::Ret(value) => {
            out.push_str("ret");
            if let Some(value) = value {
                out.push(' ');
                write_value(out, value);
            }
        }
        Inst::Call {
            out: result,
            ty,
            base,
            args,
        } => {
            if let Some(result) = result {
                let _ = write!(out, "%{} ={} ", result.name, ty);
            }
            out.push_str("call ");
            write_value(out, base);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{} ", arg.ty());
                write_value(out, arg);
            }
            out.push(')');
        }
        Inst::Bin { op, out: result, ty, a, b } => {
            let _ = write!(out, "%{} ={} {} ", result.name, ty, op.name());
            write_value(out, a);
            out.push_str(", ");
            write_value(out, b);
        }
        Inst::Jmp { target } => {
            let _ = write!(out, "jmp @{target}");
        }
        Inst::Jnz {
            cond,
            then_block,
            else_block,
        } => {
            out.push_str("jnz ");
            write_value(out, cond);
            let _ = write!(out, ", @{then_block}, @{else_block}");
        }
    }
    out.push('\n');
}

fn write_value(out: &mut String, value: &IlValue) {
    match value {
        IlValue::Temp(temp) => {
            let _ = write!(out, "%{}", temp.name);
        }
        IlValue::Global { name, .. } => {
            let _ = write!(out, "${name}");
        }
        IlValue::Const(n) => {
            let _ = write!(out, "{n}");
        }
    }
}

fn escape_byte(out: &mut String, byte: u8) {
    match byte {
        b'"' => out.push_str("\\\""),
        b'\\' => out.push_str("\\\\"),
        b'\n' => out.push_str("\\n"),
        b'\t' => out.push_str("\\t"),
        b'\r' => out.push_str("\\r"),
        0x20..=0x7e => out.push(byte as char),
        other => {
            let _ = write!(out, "\\x{other:02x}");
        }
    }
}
