use std::io::{BufRead, Write};

use crate::error::{EntrapError, EntrapResult};

/// 一条 FASTA 记录。`header` 为去掉 `>` 后的整行（首尾空白已去除），
/// 作为蛋白的唯一标识；序列按原样保留（仅去掉空白与换行）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub header: String,
    pub seq: String,
}

pub struct FastaReader<R: BufRead> {
    reader: R,
    name: String,
    buf: String,
    line_no: usize,
    done: bool,
    peek_header: Option<(String, usize)>,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            name: "<input>".to_string(),
            buf: String::new(),
            line_no: 0,
            done: false,
            peek_header: None,
        }
    }

    /// 设置错误信息中使用的来源名称（通常为文件路径）
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn read_line(&mut self) -> EntrapResult<bool> {
        self.buf.clear();
        let n = self.reader.read_line(&mut self.buf)?;
        if n == 0 {
            self.done = true;
            return Ok(false);
        }
        self.line_no += 1;
        Ok(true)
    }

    fn parse_error(&self, line: usize, message: impl Into<String>) -> EntrapError {
        EntrapError::FastaParse {
            source_name: self.name.clone(),
            line,
            message: message.into(),
        }
    }

    fn take_header(&self, line: usize) -> EntrapResult<(String, usize)> {
        let h = self.buf[1..].trim().to_string();
        if h.is_empty() {
            return Err(self.parse_error(line, "empty header"));
        }
        Ok((h, line))
    }

    pub fn next_record(&mut self) -> EntrapResult<Option<FastaRecord>> {
        // Find header line
        let (header, _) = if let Some(h) = self.peek_header.take() {
            h
        } else {
            loop {
                if self.done || !self.read_line()? {
                    return Ok(None);
                }
                if self.buf.starts_with('>') {
                    break self.take_header(self.line_no)?;
                }
                if !self.buf.trim().is_empty() {
                    return Err(self.parse_error(self.line_no, "sequence data before first header"));
                }
            }
        };

        // Read sequence lines
        let mut seq = String::new();
        while !self.done && self.read_line()? {
            if self.buf.starts_with('>') {
                self.peek_header = Some(self.take_header(self.line_no)?);
                break;
            }
            seq.extend(self.buf.chars().filter(|c| !c.is_whitespace()));
        }

        Ok(Some(FastaRecord { header, seq }))
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = EntrapResult<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

pub struct FastaWriter<W: Write> {
    writer: W,
    line_width: usize,
}

impl<W: Write> FastaWriter<W> {
    /// `line_width == 0` 表示序列不换行
    pub fn new(writer: W, line_width: usize) -> Self {
        Self { writer, line_width }
    }

    pub fn write_record(&mut self, header: &str, seq: &str) -> EntrapResult<()> {
        writeln!(self.writer, ">{}", header)?;
        if self.line_width == 0 || seq.len() <= self.line_width {
            writeln!(self.writer, "{}", seq)?;
            return Ok(());
        }
        for chunk in seq.as_bytes().chunks(self.line_width) {
            self.writer.write_all(chunk)?;
            self.writer.write_all(b"\n")?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> EntrapResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
