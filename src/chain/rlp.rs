//! Recursive Length Prefix encoding (encode only).

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Bytes(Vec<u8>),
    List(Vec<Item>),
}

impl Item {
    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Item::Bytes(value.into())
    }

    /// Big-endian with leading zeros stripped; zero is the empty string
    pub fn uint(value: u128) -> Self {
        Item::Bytes(trim_leading_zeros(&value.to_be_bytes()).to_vec())
    }
}

pub fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[first..]
}

pub fn encode(item: &Item) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(item, &mut out);
    out
}

pub fn encode_list(items: &[Item]) -> Vec<u8> {
    let mut payload = Vec::new();
    for item in items {
        encode_into(item, &mut payload);
    }
    let mut out = length_prefix(payload.len(), 0xc0);
    out.extend_from_slice(&payload);
    out
}

fn encode_into(item: &Item, out: &mut Vec<u8>) {
    match item {
        Item::Bytes(bytes) if bytes.len() == 1 && bytes[0] < 0x80 => out.push(bytes[0]),
        Item::Bytes(bytes) => {
            out.extend_from_slice(&length_prefix(bytes.len(), 0x80));
            out.extend_from_slice(bytes);
        }
        Item::List(items) => out.extend_from_slice(&encode_list(items)),
    }
}

fn length_prefix(len: usize, offset: u8) -> Vec<u8> {
    if len <= 55 {
        vec![offset + len as u8]
    } else {
        let len_bytes = trim_leading_zeros(&(len as u64).to_be_bytes()).to_vec();
        let mut out = vec![offset + 55 + len_bytes.len() as u8];
        out.extend_from_slice(&len_bytes);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enc(item: Item) -> String {
        hex::encode(encode(&item))
    }

    #[test]
    fn test_strings() {
        assert_eq!(enc(Item::bytes("dog")), "83646f67");
        assert_eq!(enc(Item::bytes("")), "80");
        assert_eq!(enc(Item::bytes(vec![0x0f])), "0f");
        assert_eq!(enc(Item::bytes(vec![0x80])), "8180");
    }

    #[test]
    fn test_integers() {
        assert_eq!(enc(Item::uint(0)), "80");
        assert_eq!(enc(Item::uint(15)), "0f");
        assert_eq!(enc(Item::uint(1024)), "820400");
    }

    #[test]
    fn test_lists() {
        assert_eq!(enc(Item::List(vec![])), "c0");
        assert_eq!(
            enc(Item::List(vec![Item::bytes("cat"), Item::bytes("dog")])),
            "c88363617483646f67"
        );
        // [ [], [[]], [ [], [[]] ] ]
        let nested = Item::List(vec![
            Item::List(vec![]),
            Item::List(vec![Item::List(vec![])]),
            Item::List(vec![Item::List(vec![]), Item::List(vec![Item::List(vec![])])]),
        ]);
        assert_eq!(enc(nested), "c7c0c1c0c3c0c1c0");
    }

    #[test]
    fn test_long_string_uses_length_of_length() {
        let text = "Lorem ipsum dolor sit amet, consectetur adipisicing elit";
        assert_eq!(text.len(), 56);
        let encoded = encode(&Item::bytes(text));
        assert_eq!(&encoded[..2], &[0xb8, 0x38]);
        assert_eq!(&encoded[2..], text.as_bytes());
    }
}
