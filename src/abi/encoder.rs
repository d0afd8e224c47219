//! 链原生二进制序列化
//!
//! 小端整数、varuint32 长度前缀、名称为 u64

use super::name::Name;

/// 可序列化为链原生字节的类型
pub trait AbiEncode {
    fn encode(&self, writer: &mut AbiWriter);
}

#[derive(Debug, Default, Clone)]
pub struct AbiWriter {
    buf: Vec<u8>,
}

impl AbiWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(value as u8);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// LEB128 风格的变长 u32
    pub fn write_varuint32(&mut self, mut value: u32) {
        loop {
            let mut byte = (value & 0x7f) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            self.buf.push(byte);
            if value == 0 {
                break;
            }
        }
    }

    /// 原始字节，不带长度前缀
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// 带 varuint32 长度前缀的字节
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_varuint32(bytes.len() as u32);
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }

    pub fn write_name(&mut self, name: &Name) {
        self.write_u64(name.as_u64());
    }

    pub fn write_vec<T: AbiEncode>(&mut self, items: &[T]) {
        self.write_varuint32(items.len() as u32);
        for item in items {
            item.encode(self);
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl AbiEncode for Name {
    fn encode(&self, writer: &mut AbiWriter) {
        writer.write_name(self);
    }
}

/// 序列化单个值
pub fn pack<T: AbiEncode + ?Sized>(value: &T) -> Vec<u8> {
    let mut writer = AbiWriter::new();
    value.encode(&mut writer);
    writer.into_bytes()
}
