use super::nom_prelude::*;

pub fn usize_<'a, E>(input: &'a str) -> IResult<&'a str, usize, E>
  where
    E: ParseError<&'a str> + error::FromExternalError<&'a str, ParseIntError>
{
  map_res(digit1, usize::from_str)(input)
}

/// A run of non-whitespace characters.
pub fn token<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
  is_not(" \t\r\n")(input)
}

/// Trailing spaces followed by a line ending or the end of input.
pub fn eol<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
  preceded(space0, alt((line_ending, eof)))(input)
}

fn comment<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, (), E> {
  value((), tuple((space0, char('#'), not_line_ending, alt((line_ending, eof)))))(input)
}

fn blank<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, (), E> {
  value((), pair(space0, line_ending))(input)
}

/// Skip blank lines and `#` comment lines.
pub fn skip_comments<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, (), E> {
  value((), many0(alt((comment, blank))))(input)
}
