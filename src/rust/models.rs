use std::fmt;

/// Base tokenizers the detector knows how to fetch by identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinTokenizer {
    /// The uncased BERT base vocabulary the detection model was fine-tuned with
    BertBaseUncased,
}

/// Where a tokenizer artifact lives and what it is called in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizerInfo {
    /// Cache directory name and public identifier
    pub name: String,
    /// Download URL of the `tokenizer.json` artifact
    pub tokenizer_url: String,
}

impl BuiltinTokenizer {
    pub fn identifier(&self) -> &'static str {
        match self {
            BuiltinTokenizer::BertBaseUncased => "bert-base-uncased",
        }
    }

    pub fn get_tokenizer_info(&self) -> TokenizerInfo {
        let name = self.identifier();
        TokenizerInfo {
            name: name.to_string(),
            tokenizer_url: format!("https://huggingface.co/{}/resolve/main/tokenizer.json", name),
        }
    }
}

impl fmt::Display for BuiltinTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}
